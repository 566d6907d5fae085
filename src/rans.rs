//! Byte-stream rANS codec: interleaved driver and container format.
//!
//! Ties the frequency model, alias table and coder states together into a
//! self-contained compressed container. The driver runs K independent coder
//! states round-robin over the byte stream; the states share one byte sink
//! (or source), and their interleaved renormalization traffic is what hides
//! the multiply latency on superscalar cores. K is plumbing, not signal:
//! the streams carry no markers, so both sides must use the same width.
//!
//! # Format
//!
//! ```text
//! [original_len: u64 LE] [freq_table: 256 × u16 LE] [payload...]
//! ```
//!
//! The encoder emits payload bytes in reverse stream order into the growing
//! output, then byte-reverses the payload region once after the flush, so
//! the finished container is read strictly forward from offset 520.
//!
//! The scale exponent and interleave width are build parameters of the
//! codec, not header fields: encode and decode must be configured
//! identically, and nothing in the container records the choice.

use crate::alias::AliasTable;
use crate::coder::{ByteCursor, Coder, ReciprocalTable};
use crate::frequency::FrequencyTable;
use crate::model::{SymbolModel, FREQ_TABLE_SIZE};
use crate::{RzError, RzResult};

/// Default scale bits (frequencies sum to 1 << 14 = 16384).
///
/// 14-bit precision keeps the rate within a few hundredths of a bit per
/// byte of the raw entropy while the remap table still fits comfortably in
/// L1/L2.
pub const DEFAULT_SCALE_BITS: u32 = 14;

/// Minimum supported scale bits. The alias builder needs the scale to
/// divide into 256 buckets of at least one position each.
pub const MIN_SCALE_BITS: u32 = 8;

/// Maximum supported scale bits, bounded by the 16-bit table words.
pub const MAX_SCALE_BITS: u32 = 16;

/// Default number of interleaved coder states.
pub const DEFAULT_INTERLEAVE: usize = 4;

/// Supported interleave widths.
pub const INTERLEAVE_WIDTHS: &[usize] = &[1, 2, 4];

/// Container header size: original length (8) + frequency table (512).
pub const HEADER_SIZE: usize = 8 + FREQ_TABLE_SIZE;

/// Original-length ceiling; anything at or above it marks a corrupt header.
const MAX_ORIGINAL_LEN: u64 = 1 << 48;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Codec build parameters.
///
/// Encode and decode must agree on every field; nothing here is recorded in
/// the container. Values outside the supported ranges are rejected as
/// [`RzError::Unsupported`], never silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Scale exponent P; frequencies are normalized to sum to `1 << P`.
    pub scale_bits: u32,
    /// Number of interleaved coder states (1, 2 or 4).
    pub interleave: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            scale_bits: DEFAULT_SCALE_BITS,
            interleave: DEFAULT_INTERLEAVE,
        }
    }
}

impl CodecOptions {
    fn validate(&self) -> RzResult<()> {
        if !(MIN_SCALE_BITS..=MAX_SCALE_BITS).contains(&self.scale_bits) {
            return Err(RzError::Unsupported);
        }
        if !INTERLEAVE_WIDTHS.contains(&self.interleave) {
            return Err(RzError::Unsupported);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Interleaved driver
// ---------------------------------------------------------------------------

/// Encode `input` through `lanes` round-robined coder states.
///
/// rANS consumes symbols last-first, so the driver walks the input from its
/// end: first the `len % lanes` tail bytes one at a time, then whole blocks
/// with the per-block puts in descending lane order, then the flushes,
/// also descending. After the payload reversal the decoder meets the seeds
/// and renormalization bytes in exactly the order its ascending-lane reads
/// expect; any other ordering scrambles the shared stream.
fn encode_symbols<S: FnMut(u8)>(
    input: &[u8],
    model: &SymbolModel,
    table: &AliasTable,
    lanes: usize,
    sink: &mut S,
) {
    let rcp = ReciprocalTable::new(model);
    let mut states = vec![Coder::new(); lanes];

    let mut i = input.len();
    while i % lanes != 0 {
        i -= 1;
        states[i % lanes].put(model, table, &rcp, input[i], sink);
    }
    while i > 0 {
        for j in (0..lanes).rev() {
            states[j].put(model, table, &rcp, input[i - lanes + j], sink);
        }
        i -= lanes;
    }
    for j in (0..lanes).rev() {
        states[j].flush(sink);
    }
}

/// Decode `count` symbols from `src` through `lanes` coder states.
///
/// Seeds are read in ascending lane order; each block resolves all lane
/// symbols before any lane touches the source again, mirroring the
/// encoder's emission order.
fn decode_symbols(
    src: &mut ByteCursor<'_>,
    table: &AliasTable,
    lanes: usize,
    count: usize,
) -> RzResult<Vec<u8>> {
    let mut states = Vec::with_capacity(lanes);
    for _ in 0..lanes {
        states.push(Coder::init(src)?);
    }

    let mut output = Vec::with_capacity(count);
    let mut i = 0;
    while i + lanes <= count {
        for state in states.iter_mut() {
            output.push(state.get(table));
        }
        for state in states.iter_mut() {
            state.renorm(src)?;
        }
        i += lanes;
    }
    for state in states.iter_mut().take(count - i) {
        output.push(state.get(table));
        state.renorm(src)?;
    }

    Ok(output)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Encode data into a self-contained container with the default options
/// (14-bit scale, 4-way interleave).
pub fn encode(input: &[u8]) -> Vec<u8> {
    encode_with_options(input, &CodecOptions::default()).expect("default options are valid")
}

/// Encode data into a self-contained container.
///
/// The container embeds the original length and the normalized frequency
/// table; the payload must be decoded with the same options.
pub fn encode_with_options(input: &[u8], options: &CodecOptions) -> RzResult<Vec<u8>> {
    options.validate()?;

    let mut output = Vec::with_capacity(HEADER_SIZE + input.len() / 2 + 4 * options.interleave);
    output.extend_from_slice(&(input.len() as u64).to_le_bytes());

    if input.is_empty() {
        // Still a well-formed container: zero length, zero table, and the
        // flushed initial states.
        output.resize(HEADER_SIZE, 0);
        let mut sink = |b: u8| output.push(b);
        for _ in 0..options.interleave {
            let mut state = Coder::new();
            state.flush(&mut sink);
        }
        output[HEADER_SIZE..].reverse();
        return Ok(output);
    }

    let counts = FrequencyTable::from_bytes(input);
    // A lone symbol at the top scale would need frequency 65536, which the
    // 16-bit table words cannot hold.
    if options.scale_bits == MAX_SCALE_BITS && counts.distinct == 1 {
        return Err(RzError::Unsupported);
    }
    let model = SymbolModel::from_counts(&counts, options.scale_bits)?;
    let table = AliasTable::new(&model)?;

    model.write_table(&mut output);
    {
        let mut sink = |b: u8| output.push(b);
        encode_symbols(input, &model, &table, options.interleave, &mut sink);
    }
    output[HEADER_SIZE..].reverse();

    Ok(output)
}

/// Decode a container produced by [`encode`].
pub fn decode(input: &[u8]) -> RzResult<Vec<u8>> {
    decode_with_options(input, &CodecOptions::default())
}

/// Decode a container produced by [`encode_with_options`] with the same
/// options.
pub fn decode_with_options(input: &[u8], options: &CodecOptions) -> RzResult<Vec<u8>> {
    options.validate()?;

    if input.len() < HEADER_SIZE {
        return Err(RzError::BadHeader);
    }
    let original_len = u64::from_le_bytes([
        input[0], input[1], input[2], input[3], input[4], input[5], input[6], input[7],
    ]);
    if original_len >= MAX_ORIGINAL_LEN {
        return Err(RzError::BadHeader);
    }
    let count = usize::try_from(original_len).map_err(|_| RzError::BadHeader)?;
    if count == 0 {
        // An empty stream's frequency table is all zeros and sums to
        // nothing, so it is accepted before the table check.
        return Ok(Vec::new());
    }

    let model = SymbolModel::from_table(&input[8..HEADER_SIZE], options.scale_bits)?;
    let table = AliasTable::new(&model)?;

    let mut src = ByteCursor::new(&input[HEADER_SIZE..]);
    decode_symbols(&mut src, &table, options.interleave, count)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
