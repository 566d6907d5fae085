//! Normalized symbol model.
//!
//! Rescales raw byte counts so they sum to exactly `1 << scale_bits` while
//! keeping every observed symbol at nonzero frequency, and (de)serializes
//! the resulting table as 256 little-endian 16-bit words.
//!
//! Normalization works on the cumulative table rather than the individual
//! frequencies: the whole prefix-sum array is rescaled in one pass, and
//! symbols whose range collapsed to zero width steal one unit of mass from
//! the smallest donor by shifting the run of cumulative entries between
//! them. The donor choice (smallest frequency above 1, lowest index on
//! ties) is part of the wire contract: it determines the alias permutation,
//! and the payload carries no redundancy to recover from a different pick.

use crate::frequency::FrequencyTable;
use crate::{RzError, RzResult};

/// Number of symbols in the byte alphabet.
pub const NUM_SYMBOLS: usize = 256;

/// Serialized frequency table size in bytes (256 × u16 LE).
pub const FREQ_TABLE_SIZE: usize = NUM_SYMBOLS * 2;

/// Frequency model normalized to a power-of-two total.
///
/// Invariants after construction: `cum[0] == 0`, `cum[256] == 1 << scale_bits`,
/// `cum[s + 1] - cum[s] == freq[s]`, and `freq[s] == 0` exactly for the
/// symbols absent from the source data.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolModel {
    /// Normalized frequency per symbol. Sums to `1 << scale_bits`.
    pub freq: [u32; NUM_SYMBOLS],
    /// Cumulative frequencies: `cum[s]` = sum of `freq[0..s]`.
    pub cum: [u32; NUM_SYMBOLS + 1],
    /// The scale exponent. Total probability mass = `1 << scale_bits`.
    pub scale_bits: u32,
}

impl SymbolModel {
    /// Normalize raw counts into a model with total mass `1 << scale_bits`.
    ///
    /// The counts must not be all zero; empty inputs are handled one level
    /// up, before a model is ever built.
    pub fn from_counts(raw: &FrequencyTable, scale_bits: u32) -> RzResult<Self> {
        let scale = 1u64 << scale_bits;
        debug_assert!(scale >= NUM_SYMBOLS as u64);

        // Raw prefix sums in 64-bit: with saturation counting the total can
        // reach 256 * 2^24, past u32.
        let mut raw_cum = [0u64; NUM_SYMBOLS + 1];
        for i in 0..NUM_SYMBOLS {
            raw_cum[i + 1] = raw_cum[i] + raw.counts[i] as u64;
        }
        let total = raw_cum[NUM_SYMBOLS];
        if total == 0 {
            return Err(RzError::InvariantViolation);
        }

        // Rescale the cumulative table to the target mass.
        let mut cum = [0u32; NUM_SYMBOLS + 1];
        for i in 1..=NUM_SYMBOLS {
            cum[i] = ((scale * raw_cum[i]) / total) as u32;
        }

        // Rescaling can collapse a low-count symbol to zero width. Restore
        // it by taking one unit from the smallest donor still above 1,
        // shifting every cumulative entry between the two by one so that
        // only the donor and the restored symbol change width.
        for i in 0..NUM_SYMBOLS {
            if raw.counts[i] != 0 && cum[i + 1] == cum[i] {
                let mut best_freq = u32::MAX;
                let mut donor = None;
                for j in 0..NUM_SYMBOLS {
                    let f = cum[j + 1] - cum[j];
                    if f > 1 && f < best_freq {
                        best_freq = f;
                        donor = Some(j);
                    }
                }
                let Some(j) = donor else {
                    return Err(RzError::InvariantViolation);
                };
                if j < i {
                    for c in cum[j + 1..=i].iter_mut() {
                        *c -= 1;
                    }
                } else {
                    for c in cum[i + 1..=j].iter_mut() {
                        *c += 1;
                    }
                }
            }
        }

        if cum[0] != 0 || cum[NUM_SYMBOLS] as u64 != scale {
            return Err(RzError::InvariantViolation);
        }

        let mut freq = [0u32; NUM_SYMBOLS];
        for i in 0..NUM_SYMBOLS {
            freq[i] = cum[i + 1] - cum[i];
            if (raw.counts[i] == 0) != (freq[i] == 0) {
                return Err(RzError::InvariantViolation);
            }
        }

        Ok(Self {
            freq,
            cum,
            scale_bits,
        })
    }

    /// Rebuild a model from a serialized frequency table.
    ///
    /// `raw` must hold at least [`FREQ_TABLE_SIZE`] bytes. The recomputed
    /// cumulative total must equal `1 << scale_bits`; anything else means
    /// the header is corrupt or was written with a different scale.
    pub fn from_table(raw: &[u8], scale_bits: u32) -> RzResult<Self> {
        if raw.len() < FREQ_TABLE_SIZE {
            return Err(RzError::BadHeader);
        }

        let mut freq = [0u32; NUM_SYMBOLS];
        for (i, f) in freq.iter_mut().enumerate() {
            let off = i * 2;
            *f = u16::from_le_bytes([raw[off], raw[off + 1]]) as u32;
        }

        let mut cum = [0u32; NUM_SYMBOLS + 1];
        for i in 0..NUM_SYMBOLS {
            cum[i + 1] = cum[i] + freq[i];
        }
        if cum[NUM_SYMBOLS] != 1u32 << scale_bits {
            return Err(RzError::BadHeader);
        }

        Ok(Self {
            freq,
            cum,
            scale_bits,
        })
    }

    /// Serialize the frequency table (256 × u16 LE).
    pub fn write_table(&self, output: &mut Vec<u8>) {
        for &f in &self.freq {
            output.extend_from_slice(&(f as u16).to_le_bytes());
        }
    }

    /// Total probability mass.
    #[inline]
    pub fn scale(&self) -> u32 {
        1 << self.scale_bits
    }
}
