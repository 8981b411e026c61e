//! 🧮 Distinct counting, exact or approximate, behind one merge interface.
//!
//! 🧠 Knowledge graph:
//! - `DistinctCounting` is the config knob (`runtime.distinct_counting`).
//! - `DistinctSet` is what lives inside `PartialStats` for unique words and speakers.
//! - Exact = `HashSet<String>` (union on merge). Approximate = `HllSketch` (register max).
//! - Exact ∪ Approximate folds the exact items into the sketch, so merge stays total.
//!   The strategy only changes when the config says so. No silent algorithm swaps.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::hll::{DEFAULT_PRECISION, HllSketch};

/// 🔧 Which distinct counter to build accumulators with.
///
/// ```toml
/// [runtime.distinct_counting]
/// strategy = "approximate"
/// precision = 12
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DistinctCounting {
    /// 🎯 exact sets. exact answers. memory grows with the vocabulary.
    #[default]
    Exact,
    /// 📐 HyperLogLog with `2^precision` registers. fixed memory. ~1.04/sqrt(2^p) error.
    Approximate {
        #[serde(default = "default_precision")]
        precision: u8,
    },
}

fn default_precision() -> u8 {
    DEFAULT_PRECISION
}

/// 📦 A set of distinct strings, or a sketch that pretends to be one.
#[derive(Debug, Clone, PartialEq)]
pub enum DistinctSet {
    Exact(HashSet<String>),
    Approximate(HllSketch),
}

impl Default for DistinctSet {
    fn default() -> Self {
        DistinctSet::Exact(HashSet::new())
    }
}

impl DistinctSet {
    /// 🏗️ An empty counter of the configured kind. This is the merge identity.
    pub fn for_strategy(strategy: DistinctCounting) -> Self {
        match strategy {
            DistinctCounting::Exact => DistinctSet::Exact(HashSet::new()),
            DistinctCounting::Approximate { precision } => {
                DistinctSet::Approximate(HllSketch::new(precision))
            }
        }
    }

    /// ➕ Observe a borrowed item. Exact sets only allocate when the item is new.
    pub fn insert(&mut self, item: &str) {
        match self {
            DistinctSet::Exact(set) => {
                if !set.contains(item) {
                    set.insert(item.to_owned());
                }
            }
            DistinctSet::Approximate(sketch) => sketch.insert(item),
        }
    }

    /// ➕ Observe an owned item, handing the allocation over if it's new.
    pub fn insert_owned(&mut self, item: String) {
        match self {
            DistinctSet::Exact(set) => {
                set.insert(item);
            }
            DistinctSet::Approximate(sketch) => sketch.insert(&item),
        }
    }

    /// 🔢 How many distinct items (exact, or estimated).
    pub fn count(&self) -> u64 {
        match self {
            DistinctSet::Exact(set) => set.len() as u64,
            DistinctSet::Approximate(sketch) => sketch.estimate(),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, DistinctSet::Exact(_))
    }

    /// 🔀 Union. Consumes both sides; the smaller exact set is poured into the larger one.
    pub fn merge(self, other: DistinctSet) -> DistinctSet {
        match (self, other) {
            (DistinctSet::Exact(a), DistinctSet::Exact(b)) => {
                let (mut bigger, smaller) = if a.len() >= b.len() { (a, b) } else { (b, a) };
                bigger.extend(smaller);
                DistinctSet::Exact(bigger)
            }
            (DistinctSet::Approximate(mut a), DistinctSet::Approximate(b)) => {
                a.merge(&b);
                DistinctSet::Approximate(a)
            }
            (DistinctSet::Approximate(mut sketch), DistinctSet::Exact(items))
            | (DistinctSet::Exact(items), DistinctSet::Approximate(mut sketch)) => {
                for item in &items {
                    sketch.insert(item);
                }
                DistinctSet::Approximate(sketch)
            }
        }
    }
}
