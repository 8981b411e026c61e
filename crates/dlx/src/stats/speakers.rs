//! 🗣️ Per-speaker breakdown: who talks the most, the longest, and about what.
//!
//! Off by default (`runtime.speaker_breakdown = false`). When on, every accumulator
//! keeps a `BTreeMap<speaker, SpeakerStats>`. Merge is key-wise: sums for counters,
//! summed word frequencies. Always exact, so it costs memory per speaker × vocabulary.

use std::collections::HashMap;

use serde::Serialize;

/// 🎯 how many favourite words a speaker gets in the report
pub const TOP_WORDS: usize = 3;

/// 📦 Running totals for one speaker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpeakerStats {
    pub lines: u64,
    pub words: u64,
    pub chars: u64,
    pub word_frequencies: HashMap<String, u64>,
}

impl SpeakerStats {
    /// ➕ Count one more occurrence of a normalized word.
    pub fn observe_word(&mut self, word: &str) {
        match self.word_frequencies.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                self.word_frequencies.insert(word.to_owned(), 1);
            }
        }
    }

    /// 🔀 Fold another speaker's totals into this one.
    pub fn merge(&mut self, other: SpeakerStats) {
        self.lines += other.lines;
        self.words += other.words;
        self.chars += other.chars;
        for (word, count) in other.word_frequencies {
            *self.word_frequencies.entry(word).or_insert(0) += count;
        }
    }

    /// 📋 Flatten into the report row for `speaker`.
    pub fn summarize(&self, speaker: &str) -> SpeakerSummary {
        let mut ranked: Vec<(&String, &u64)> = self.word_frequencies.iter().collect();
        // -- most frequent first, alphabetical on ties, so the report is stable run to run
        ranked.sort_by(|(word_a, count_a), (word_b, count_b)| {
            count_b.cmp(count_a).then_with(|| word_a.cmp(word_b))
        });

        SpeakerSummary {
            speaker: speaker.to_owned(),
            lines: self.lines,
            words: self.words,
            characters: self.chars,
            unique_words: self.word_frequencies.len() as u64,
            top_words: ranked
                .into_iter()
                .take(TOP_WORDS)
                .map(|(word, &count)| WordCount {
                    word: word.clone(),
                    count,
                })
                .collect(),
        }
    }
}

/// 📋 One speaker's row in the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakerSummary {
    pub speaker: String,
    pub lines: u64,
    pub words: u64,
    pub characters: u64,
    pub unique_words: u64,
    pub top_words: Vec<WordCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}
