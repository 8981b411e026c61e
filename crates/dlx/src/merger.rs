// ai
//! 🔀 StatsMerger: the algebra that makes the whole thing scale.
//!
//! 🎬 *[two PartialStats walk into a reducer. one PartialStats walks out.]*
//!
//! Counters add. Distinct sets union. Speaker breakdowns merge key by key. Every one of
//! those is associative and commutative with the empty `PartialStats` as identity, so
//! the shape of the reduction (linear fold, balanced tree, merge-as-they-finish) cannot
//! change the answer. Only how long it takes.
//!
//! 🧠 Knowledge graph:
//! - `merge(a, b)`: consumes both. Ownership of the result is the only thing left.
//! - `reduce_tree`: pairwise, level by level. O(log n) merge path.
//! - `reduce_linear`: left fold. What `MergeTopology::Streaming` does as shards finish.
//! - Infallible. There is no error type here because there is no error.

use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use crate::stats::PartialStats;

/// 🌳 How the supervisor combines finished shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeTopology {
    /// collect every shard, then reduce pairwise
    #[default]
    Tree,
    /// fold each shard into the running total the moment it completes
    Streaming,
}

/// 🔀 Merge two partial results into one. Both inputs are consumed.
pub fn merge(mut a: PartialStats, b: PartialStats) -> PartialStats {
    merge_into(&mut a, b);
    a
}

/// 🔀 Merge `other` into `acc` in place. `other` is consumed and can't be read again.
pub fn merge_into(acc: &mut PartialStats, other: PartialStats) {
    acc.line_count += other.line_count;
    acc.word_count += other.word_count;
    acc.char_count += other.char_count;

    let unique_words = std::mem::take(&mut acc.unique_words);
    acc.unique_words = unique_words.merge(other.unique_words);

    let speaking_characters = std::mem::take(&mut acc.speaking_characters);
    acc.speaking_characters = speaking_characters.merge(other.speaking_characters);

    for (speaker, speaker_stats) in other.speakers {
        match acc.speakers.entry(speaker) {
            Entry::Vacant(vacant) => {
                vacant.insert(speaker_stats);
            }
            Entry::Occupied(mut occupied) => occupied.get_mut().merge(speaker_stats),
        }
    }
}

/// 🌳 Pairwise tree reduction. An empty input reduces to the identity.
pub fn reduce_tree(parts: Vec<PartialStats>) -> PartialStats {
    let mut level = parts;
    while level.len() > 1 {
        let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
        let mut pairs = level.into_iter();
        while let Some(left) = pairs.next() {
            match pairs.next() {
                Some(right) => next_level.push(merge(left, right)),
                // -- odd one out rides up to the next level untouched
                None => next_level.push(left),
            }
        }
        level = next_level;
    }
    level.pop().unwrap_or_default()
}

/// ➡️ Left fold over any number of parts. An empty input reduces to the identity.
pub fn reduce_linear(parts: impl IntoIterator<Item = PartialStats>) -> PartialStats {
    let mut parts = parts.into_iter();
    let Some(mut acc) = parts.next() else {
        return PartialStats::default();
    };
    for part in parts {
        merge_into(&mut acc, part);
    }
    acc
}

impl MergeTopology {
    /// 🔀 Reduce already-collected parts with this topology.
    pub fn reduce(self, parts: Vec<PartialStats>) -> PartialStats {
        match self {
            MergeTopology::Tree => reduce_tree(parts),
            MergeTopology::Streaming => reduce_linear(parts),
        }
    }
}
