//! 📐 HyperLogLog: counting distinct things without remembering them.
//!
//! `2^p` one-byte registers. Each item is hashed with xxh64; the top `p` bits pick a
//! register, and the register keeps the longest run of leading zeros (+1) seen in the
//! remaining bits. Merge is register-wise max, which is associative, commutative and
//! idempotent, so sketches can be combined in any order at any level of the merge tree.
//!
//! Standard error ≈ `1.04 / sqrt(2^p)`. At the default p = 14 that's ~0.8% for 16 KiB.
//! An exact `HashSet` of a big corpus's vocabulary costs megabytes. Pick your poison.

use tracing::warn;
use xxhash_rust::xxh64::xxh64;

/// 📉 smallest precision we accept (16 registers, ~26% error, mostly for tests and masochists)
pub const MIN_PRECISION: u8 = 4;
/// 📈 largest precision we accept (65,536 registers, 64 KiB per sketch)
pub const MAX_PRECISION: u8 = 16;
/// 🎯 the sweet spot
pub const DEFAULT_PRECISION: u8 = 14;

const HASH_SEED: u64 = 0;

/// 📊 A mergeable approximate distinct counter.
#[derive(Clone, PartialEq, Eq)]
pub struct HllSketch {
    precision: u8,
    registers: Vec<u8>,
}

// -- 🎭 hand-rolled Debug: nobody wants 16,384 zeros in their log line
impl std::fmt::Debug for HllSketch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HllSketch")
            .field("precision", &self.precision)
            .field("estimate", &self.estimate())
            .finish()
    }
}

impl HllSketch {
    /// 🚀 An empty sketch. Precision is clamped into `MIN_PRECISION..=MAX_PRECISION`, loudly.
    pub fn new(precision: u8) -> Self {
        let clamped = precision.clamp(MIN_PRECISION, MAX_PRECISION);
        if clamped != precision {
            warn!(
                "📐 HyperLogLog precision {} is outside {}..={}, using {} instead",
                precision, MIN_PRECISION, MAX_PRECISION, clamped
            );
        }
        let precision = clamped;
        Self {
            precision,
            registers: vec![0; 1 << precision],
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn is_empty(&self) -> bool {
        self.registers.iter().all(|&r| r == 0)
    }

    /// ➕ Observe one item.
    pub fn insert(&mut self, item: &str) {
        self.insert_hash(xxh64(item.as_bytes(), HASH_SEED));
    }

    fn insert_hash(&mut self, hash: u64) {
        let p = u32::from(self.precision);
        let index = (hash >> (64 - p)) as usize;
        let rank = rank_of(hash << p, 64 - p);
        if rank > self.registers[index] {
            self.registers[index] = rank;
        }
    }

    /// 🔀 Fold `other` into `self` (register-wise max).
    ///
    /// Sketches of different precision are brought down to the coarser one first.
    /// A pipeline configured consistently never hits that path.
    pub fn merge(&mut self, other: &HllSketch) {
        if other.precision != self.precision {
            warn!(
                "⚠️ merging HLL sketches of precision {} and {}; reducing to the coarser one",
                self.precision, other.precision
            );
        }

        if other.precision < self.precision {
            *self = self.reduced_to(other.precision);
        }

        if other.precision > self.precision {
            let reduced = other.reduced_to(self.precision);
            self.max_registers(&reduced.registers);
        } else {
            self.max_registers(&other.registers);
        }
    }

    fn max_registers(&mut self, other: &[u8]) {
        for (mine, theirs) in self.registers.iter_mut().zip(other) {
            if *theirs > *mine {
                *mine = *theirs;
            }
        }
    }

    /// 📉 Re-bucket this sketch at a lower precision.
    ///
    /// The low `shift` bits of an old register index become the leading bits of the
    /// hash remainder at the new precision, so the result is exactly the sketch that
    /// would have been built at `precision` from the start.
    pub fn reduced_to(&self, precision: u8) -> HllSketch {
        let precision = precision.clamp(MIN_PRECISION, MAX_PRECISION);
        if precision >= self.precision {
            return self.clone();
        }

        let shift = u32::from(self.precision - precision);
        let mut reduced = HllSketch::new(precision);
        for (index, &rank) in self.registers.iter().enumerate() {
            if rank == 0 {
                continue;
            }
            let new_index = index >> shift;
            let dropped = (index as u64) & ((1u64 << shift) - 1);
            let new_rank = if dropped != 0 {
                // -- leading zeros of `dropped` counted inside a `shift`-bit window
                (dropped.leading_zeros() - (64 - shift) + 1) as u8
            } else {
                shift as u8 + rank
            };
            if new_rank > reduced.registers[new_index] {
                reduced.registers[new_index] = new_rank;
            }
        }
        reduced
    }

    /// 🔮 Estimated number of distinct items observed.
    pub fn estimate(&self) -> u64 {
        let m = self.registers.len() as f64;
        let mut inverse_sum = 0.0f64;
        let mut zeros = 0usize;
        for &rank in &self.registers {
            inverse_sum += 2f64.powi(-i32::from(rank));
            if rank == 0 {
                zeros += 1;
            }
        }

        let alpha = match self.registers.len() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        };
        let raw = alpha * m * m / inverse_sum;

        // -- 🔧 small-range correction: linear counting while empty registers remain
        let estimate = if raw <= 2.5 * m && zeros > 0 {
            m * (m / zeros as f64).ln()
        } else {
            raw
        };
        estimate.round() as u64
    }
}

/// 1-based position of the first set bit, capped for the all-zero remainder.
fn rank_of(remainder: u64, max_bits: u32) -> u8 {
    (remainder.leading_zeros().min(max_bits) + 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sketch_of(precision: u8, range: std::ops::Range<u32>) -> HllSketch {
        let mut sketch = HllSketch::new(precision);
        for i in range {
            sketch.insert(&format!("word-{i}"));
        }
        sketch
    }

    #[test]
    fn the_one_where_an_empty_sketch_counts_nothing() {
        let sketch = HllSketch::new(DEFAULT_PRECISION);
        assert!(sketch.is_empty());
        assert_eq!(sketch.estimate(), 0);
    }

    #[test]
    fn the_one_where_precision_gets_clamped_into_the_sane_range() {
        assert_eq!(HllSketch::new(0).precision(), MIN_PRECISION);
        assert_eq!(HllSketch::new(99).precision(), MAX_PRECISION);
        assert_eq!(HllSketch::new(MIN_PRECISION).precision(), MIN_PRECISION);
        assert_eq!(HllSketch::new(MAX_PRECISION).precision(), MAX_PRECISION);
    }

    #[test]
    fn the_one_where_duplicates_do_not_inflate_the_estimate() {
        let mut sketch = HllSketch::new(DEFAULT_PRECISION);
        for _ in 0..1_000 {
            sketch.insert("hello");
            sketch.insert("there");
        }
        assert_eq!(sketch.estimate(), 2);
    }

    #[test]
    fn the_one_where_ten_thousand_words_land_within_a_few_percent() {
        let sketch = sketch_of(DEFAULT_PRECISION, 0..10_000);
        let estimate = sketch.estimate() as f64;
        let error = (estimate - 10_000.0).abs() / 10_000.0;
        assert!(error < 0.05, "💀 estimate {estimate} is {error:.3} off");
    }

    #[test]
    fn the_one_where_merging_equals_inserting_into_one_sketch() {
        let left = sketch_of(12, 0..3_000);
        let right = sketch_of(12, 2_000..6_000);
        let together = sketch_of(12, 0..6_000);

        let mut left_then_right = left.clone();
        left_then_right.merge(&right);
        let mut right_then_left = right.clone();
        right_then_left.merge(&left);

        assert_eq!(left_then_right, together);
        assert_eq!(right_then_left, together);
    }

    #[test]
    fn the_one_where_merging_with_yourself_changes_nothing() {
        let sketch = sketch_of(10, 0..500);
        let mut doubled = sketch.clone();
        doubled.merge(&sketch);
        assert_eq!(doubled, sketch);
    }

    #[test]
    fn the_one_where_reducing_precision_matches_building_coarse_from_scratch() {
        let fine = sketch_of(14, 0..5_000);
        let coarse = sketch_of(10, 0..5_000);
        assert_eq!(fine.reduced_to(10), coarse);
    }

    #[test]
    fn the_one_where_mixed_precisions_merge_at_the_coarser_one() {
        let mut fine = sketch_of(14, 0..1_000);
        let coarse = sketch_of(10, 1_000..2_000);
        fine.merge(&coarse);
        assert_eq!(fine.precision(), 10);
        assert_eq!(fine, sketch_of(10, 0..2_000));
    }
}
