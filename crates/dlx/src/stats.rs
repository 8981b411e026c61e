// ai
//! 📊 Stats: the accumulator, the final report, and the five sacred keys.
//!
//! 🎬 *[a shard finishes. it hands over a PartialStats. it is never seen again.]*
//!
//! 🧠 Knowledge graph:
//! - `PartialStats`: the unit of merge. One per shard, mutated only by its own
//!   `LocalAggregator`, then consumed exactly once by `merger::merge`.
//! - `PartialStats::default()` / `PartialStats::empty(..)`: the merge identity.
//! - `FinalStats`: the five headline numbers (plus the optional speaker breakdown).
//!   Serializes with the exact output key strings below.
//! - Distinct counts live in `distinct::DistinctSet` so the exact/approximate choice is
//!   one config knob away, not a rewrite away.

pub mod distinct;
pub mod hll;
pub mod speakers;

use std::collections::BTreeMap;

use serde::Serialize;

pub use distinct::{DistinctCounting, DistinctSet};
pub use hll::HllSketch;
pub use speakers::{SpeakerStats, SpeakerSummary, WordCount};

pub const TOTAL_LINES_KEY: &str = "Total Lines Processed";
pub const TOTAL_WORDS_KEY: &str = "Total Words Processed";
pub const TOTAL_CHARACTERS_KEY: &str = "Total Characters Processed";
pub const UNIQUE_WORDS_KEY: &str = "Total Unique Words Identified";
pub const SPEAKING_CHARACTERS_KEY: &str = "Number of Characters Speaking";

/// 📋 The output keys, in report order.
pub const STAT_KEYS: [&str; 5] = [
    TOTAL_LINES_KEY,
    TOTAL_WORDS_KEY,
    TOTAL_CHARACTERS_KEY,
    UNIQUE_WORDS_KEY,
    SPEAKING_CHARACTERS_KEY,
];

/// 📦 A mergeable partial result over some subset of the dialogue lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialStats {
    pub line_count: u64,
    pub word_count: u64,
    pub char_count: u64,
    pub unique_words: DistinctSet,
    /// 🗣️ raw (trimmed) speaker names, case-sensitive. `""` is a valid speaker.
    pub speaking_characters: DistinctSet,
    /// empty unless the speaker breakdown is switched on
    pub speakers: BTreeMap<String, SpeakerStats>,
}

impl PartialStats {
    /// 🏗️ The identity accumulator for a given distinct-counting strategy.
    pub fn empty(strategy: DistinctCounting) -> Self {
        Self {
            unique_words: DistinctSet::for_strategy(strategy),
            speaking_characters: DistinctSet::for_strategy(strategy),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_count == 0
    }

    /// 🏁 Freeze into the final report.
    pub fn finish(self) -> FinalStats {
        FinalStats::from(self)
    }
}

/// 🏆 The final statistics record. Field renames ARE the output keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalStats {
    #[serde(rename = "Total Lines Processed")]
    pub total_lines: u64,
    #[serde(rename = "Total Words Processed")]
    pub total_words: u64,
    #[serde(rename = "Total Characters Processed")]
    pub total_characters: u64,
    #[serde(rename = "Total Unique Words Identified")]
    pub unique_words: u64,
    #[serde(rename = "Number of Characters Speaking")]
    pub speaking_characters: u64,
    #[serde(rename = "Speakers", skip_serializing_if = "Option::is_none")]
    pub speakers: Option<Vec<SpeakerSummary>>,
}

impl FinalStats {
    /// 🔑 `(key, value)` pairs in report order. This is the statistic-name → integer mapping.
    pub fn named_values(&self) -> [(&'static str, u64); 5] {
        [
            (TOTAL_LINES_KEY, self.total_lines),
            (TOTAL_WORDS_KEY, self.total_words),
            (TOTAL_CHARACTERS_KEY, self.total_characters),
            (UNIQUE_WORDS_KEY, self.unique_words),
            (SPEAKING_CHARACTERS_KEY, self.speaking_characters),
        ]
    }
}

impl From<PartialStats> for FinalStats {
    fn from(stats: PartialStats) -> Self {
        // -- BTreeMap iteration is sorted by speaker name, so the breakdown is too
        let speakers = if stats.speakers.is_empty() {
            None
        } else {
            Some(
                stats
                    .speakers
                    .iter()
                    .map(|(speaker, speaker_stats)| speaker_stats.summarize(speaker))
                    .collect(),
            )
        };

        FinalStats {
            total_lines: stats.line_count,
            total_words: stats.word_count,
            total_characters: stats.char_count,
            unique_words: stats.unique_words.count(),
            speaking_characters: stats.speaking_characters.count(),
            speakers,
        }
    }
}
