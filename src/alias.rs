//! Alias-table acceleration for symbol lookup.
//!
//! Vose's method splits the probability mass into 256 equal-height buckets,
//! each shared by at most two symbols, so the decoder resolves a symbol from
//! the low state bits with one shift, one compare and one table read, no
//! matter how skewed the distribution is. The encode side gets `remap`, the
//! inverse permutation that turns a symbol's cumulative slot into the
//! absolute bucket position the decoder will observe.
//!
//! The construction sweep's cursor moves and tie-breaks mirror the
//! normalization's donor rule: they define the permutation, and the payload
//! carries no redundancy to survive a different choice.
//!
//! Per-bucket layout, for bucket `i` with donor `j = sym_id[2i]`:
//!
//! ```text
//! position  i*T .. i*T + h0      primary symbol i   slot 2i + 1
//! position  i*T + h0 .. (i+1)*T  donor symbol j     slot 2i + 0
//! ```
//!
//! where `T` is the bucket height and `h0` the primary's share. `divider`
//! stores `i*T + h0` as an absolute threshold so the decode compare needs no
//! subtraction, and `slot_adjust` folds each slot's base offsets into one
//! constant so the state update is a single multiply-add and subtract.

use crate::model::{SymbolModel, NUM_SYMBOLS};
use crate::{RzError, RzResult};

/// log2 of the bucket count (one bucket per alphabet symbol).
const LOG2_NUM_SYMBOLS: u32 = 8;

/// Alias table over a normalized [`SymbolModel`].
///
/// Read-only after construction; interleaved coder states share one table
/// by reference.
#[derive(Debug, Clone)]
pub struct AliasTable {
    /// Absolute threshold splitting each bucket between its two symbols.
    divider: [u32; NUM_SYMBOLS],
    /// The two symbols occupying each bucket; `2i + 1` is the primary.
    sym_id: [u8; NUM_SYMBOLS * 2],
    /// Frequency of the symbol in each half-bucket.
    slot_freqs: [u32; NUM_SYMBOLS * 2],
    /// Precomputed offset for the decode state reconstruction.
    slot_adjust: [u32; NUM_SYMBOLS * 2],
    /// Encode-side permutation: cumulative slot → absolute position.
    remap: Vec<u32>,
    scale_bits: u32,
}

impl AliasTable {
    /// Build the alias table for a normalized model.
    pub fn new(model: &SymbolModel) -> RzResult<Self> {
        let scale = model.scale();
        let tgt = scale / NUM_SYMBOLS as u32;
        if tgt == 0 || scale % NUM_SYMBOLS as u32 != 0 {
            return Err(RzError::InvariantViolation);
        }

        // Vose sweep: top up every "small" symbol (fewer than tgt slots
        // left) from the current "large" one. A large symbol that drops
        // below tgt behind the small cursor is revisited immediately.
        let mut remaining = model.freq;
        let mut divider = [tgt; NUM_SYMBOLS];
        let mut sym_id = [0u8; NUM_SYMBOLS * 2];
        for i in 0..NUM_SYMBOLS {
            sym_id[i * 2] = i as u8;
            sym_id[i * 2 + 1] = i as u8;
        }

        let mut cur_large = 0;
        while cur_large < NUM_SYMBOLS && remaining[cur_large] < tgt {
            cur_large += 1;
        }
        let mut cur_small = 0;
        while cur_small < NUM_SYMBOLS && remaining[cur_small] >= tgt {
            cur_small += 1;
        }
        let mut next_small = cur_small + 1;

        while cur_large < NUM_SYMBOLS && cur_small < NUM_SYMBOLS {
            sym_id[cur_small * 2] = cur_large as u8;
            divider[cur_small] = remaining[cur_small];
            remaining[cur_large] -= tgt - divider[cur_small];

            if remaining[cur_large] >= tgt || next_small <= cur_large {
                cur_small = next_small;
                while cur_small < NUM_SYMBOLS && remaining[cur_small] >= tgt {
                    cur_small += 1;
                }
                next_small = cur_small + 1;
            } else {
                // The donor just became small and sits behind the cursor.
                cur_small = cur_large;
            }

            while cur_large < NUM_SYMBOLS && remaining[cur_large] < tgt {
                cur_large += 1;
            }
        }

        // Materialize the slots bucket by bucket, handing out each symbol's
        // code points in increasing cumulative order.
        let mut assigned = [0u32; NUM_SYMBOLS];
        let mut remap = vec![0u32; scale as usize];
        let mut slot_freqs = [0u32; NUM_SYMBOLS * 2];
        let mut slot_adjust = [0u32; NUM_SYMBOLS * 2];

        for i in 0..NUM_SYMBOLS {
            let j = sym_id[i * 2] as usize;
            let h0 = divider[i];
            let h1 = tgt - h0;
            let base0 = assigned[i];
            let base1 = assigned[j];
            let cbase0 = model.cum[i] + base0;
            let cbase1 = model.cum[j] + base1;
            let bucket_base = i as u32 * tgt;

            divider[i] = bucket_base + h0;
            slot_freqs[i * 2 + 1] = model.freq[i];
            slot_freqs[i * 2] = model.freq[j];
            slot_adjust[i * 2 + 1] = bucket_base.wrapping_sub(base0);
            slot_adjust[i * 2] = bucket_base.wrapping_sub(base1.wrapping_sub(h0));
            for k in 0..h0 {
                remap[(cbase0 + k) as usize] = bucket_base + k;
            }
            for k in 0..h1 {
                remap[(cbase1 + k) as usize] = bucket_base + h0 + k;
            }
            assigned[i] += h0;
            assigned[j] += h1;
        }

        // Every symbol must have received exactly its frequency in slots.
        for i in 0..NUM_SYMBOLS {
            if assigned[i] != model.freq[i] {
                return Err(RzError::InvariantViolation);
            }
        }

        Ok(Self {
            divider,
            sym_id,
            slot_freqs,
            slot_adjust,
            remap,
            scale_bits: model.scale_bits,
        })
    }

    /// Resolve the half-bucket slot for a position in `[0, scale)`.
    #[inline]
    pub fn slot_for(&self, xm: u32) -> usize {
        let bucket = (xm >> (self.scale_bits - LOG2_NUM_SYMBOLS)) as usize;
        let slot = bucket * 2;
        if xm < self.divider[bucket] {
            slot + 1
        } else {
            slot
        }
    }

    /// The symbol occupying a slot.
    #[inline]
    pub fn symbol(&self, slot: usize) -> u8 {
        self.sym_id[slot]
    }

    /// Frequency of the symbol occupying a slot.
    #[inline]
    pub fn slot_freq(&self, slot: usize) -> u32 {
        self.slot_freqs[slot]
    }

    /// Decode-side offset for a slot's state reconstruction.
    #[inline]
    pub fn slot_adjust(&self, slot: usize) -> u32 {
        self.slot_adjust[slot]
    }

    /// Encode-side lookup: absolute position for a cumulative slot.
    #[inline]
    pub fn remap(&self, cum_slot: u32) -> u32 {
        self.remap[cum_slot as usize]
    }

    /// The scale exponent the table was built for.
    #[inline]
    pub fn scale_bits(&self) -> u32 {
        self.scale_bits
    }

    /// Mask extracting a position in `[0, scale)` from a coder state.
    #[inline]
    pub fn mask(&self) -> u32 {
        (1 << self.scale_bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyTable;

    fn table_for(input: &[u8], scale_bits: u32) -> (SymbolModel, AliasTable) {
        let model =
            SymbolModel::from_counts(&FrequencyTable::from_bytes(input), scale_bits).unwrap();
        let table = AliasTable::new(&model).unwrap();
        (model, table)
    }

    /// Symbol and recovered in-symbol offset for an absolute position, the
    /// way the decoder sees it.
    fn resolve(table: &AliasTable, y: u32) -> (u8, u32) {
        let slot = table.slot_for(y);
        (table.symbol(slot), y.wrapping_sub(table.slot_adjust(slot)))
    }

    fn assert_table_consistent(model: &SymbolModel, table: &AliasTable) {
        // Each symbol owns exactly freq[s] positions.
        let mut seen = [0u32; NUM_SYMBOLS];
        for y in 0..model.scale() {
            let (sym, _) = resolve(table, y);
            seen[sym as usize] += 1;
        }
        assert_eq!(seen, model.freq, "position counts disagree with model");

        // remap is the exact inverse: every (symbol, offset) pair maps to a
        // position that resolves back to it.
        let mut hit = vec![false; model.scale() as usize];
        for s in 0..NUM_SYMBOLS {
            for delta in 0..model.freq[s] {
                let y = table.remap(model.cum[s] + delta);
                assert!(y < model.scale());
                assert!(!hit[y as usize], "remap is not a bijection");
                hit[y as usize] = true;
                let (sym, back) = resolve(table, y);
                assert_eq!(sym as usize, s);
                assert_eq!(back, delta);
            }
        }
        assert!(hit.iter().all(|&h| h), "remap does not cover the scale");
    }

    #[test]
    fn test_two_symbol_split() {
        // Two symbols force every bucket to be donated or split.
        let input: Vec<u8> = [0x00, 0xff].repeat(64);
        let (model, table) = table_for(&input, 14);
        assert_table_consistent(&model, &table);
    }

    #[test]
    fn test_single_symbol() {
        let (model, table) = table_for(&[7u8; 32], 14);
        assert_table_consistent(&model, &table);
        // Every position resolves to the only symbol.
        assert_eq!(resolve(&table, 0).0, 7);
        assert_eq!(resolve(&table, model.scale() - 1).0, 7);
    }

    #[test]
    fn test_skewed_distribution() {
        let mut input = vec![b'a'; 1000];
        input.extend(vec![b'b'; 100]);
        input.extend(vec![b'c'; 10]);
        input.push(b'd');
        let (model, table) = table_for(&input, 12);
        assert_table_consistent(&model, &table);
    }

    #[test]
    fn test_full_alphabet() {
        let mut input: Vec<u8> = (0..=255).collect();
        input.extend((0..=255u8).map(|b| b.wrapping_mul(37)));
        let (model, table) = table_for(&input, 14);
        assert_table_consistent(&model, &table);
    }

    #[test]
    fn test_minimum_scale() {
        // At scale 2^8 the buckets are one position tall.
        let input: Vec<u8> = (0..64u8).flat_map(|b| [b; 3]).collect();
        let (model, table) = table_for(&input, 8);
        assert_table_consistent(&model, &table);
    }

    #[test]
    fn test_text_distribution() {
        let input = b"the quick brown fox jumps over the lazy dog".repeat(20);
        let (model, table) = table_for(&input, 14);
        assert_table_consistent(&model, &table);
    }
}
