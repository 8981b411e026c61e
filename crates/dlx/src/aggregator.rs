// ai
//! 🧺 LocalAggregator: the leaf of the merge tree.
//!
//! 🎬 *[one shard. one accumulator. no roommates. no locks. no drama.]*
//!
//! Each shard worker owns exactly one `LocalAggregator`. It parses raw lines, drops the
//! ones that aren't dialogue, and folds the rest into its private `PartialStats`.
//! Nothing here is shared, so nothing here is locked.
//!
//! 🧠 Knowledge graph:
//! - Upstream: `dialogue::parse_line` (RecordParser), `words::normalized_words` (WordNormalizer)
//! - Downstream: `finish()` hands the `PartialStats` to `merger` and the aggregator is gone
//! - Per record: speaker → speaking characters; words → unique words + word count;
//!   raw dialogue length → char count; +1 line. Optional per-speaker breakdown on top.

use crate::common::page_lines;
use crate::dialogue::{DialogueRecord, parse_line};
use crate::stats::{DistinctCounting, PartialStats, SpeakerStats};
use crate::words::normalized_words;

/// 📦 A single shard's private accumulator plus the knobs that shape it.
#[derive(Debug, Clone)]
pub struct LocalAggregator {
    stats: PartialStats,
    speaker_breakdown: bool,
    // -- 🗑️ lines that weren't dialogue. not a statistic, just something to log.
    skipped_lines: u64,
}

impl Default for LocalAggregator {
    fn default() -> Self {
        Self::new(DistinctCounting::Exact, false)
    }
}

impl LocalAggregator {
    pub fn new(distinct_counting: DistinctCounting, speaker_breakdown: bool) -> Self {
        Self {
            stats: PartialStats::empty(distinct_counting),
            speaker_breakdown,
            skipped_lines: 0,
        }
    }

    /// 🧺 Fold one valid dialogue record into the accumulator.
    pub fn fold(&mut self, record: DialogueRecord<'_>) {
        let stats = &mut self.stats;
        stats.speaking_characters.insert(record.speaker);

        let mut speaker_stats = if self.speaker_breakdown {
            Some(
                stats
                    .speakers
                    .entry(record.speaker.to_owned())
                    .or_insert_with(SpeakerStats::default),
            )
        } else {
            None
        };

        let mut words = 0u64;
        for word in normalized_words(record.dialogue) {
            words += 1;
            if let Some(speaker_stats) = speaker_stats.as_deref_mut() {
                speaker_stats.observe_word(&word);
            }
            stats.unique_words.insert_owned(word);
        }

        let chars = record.dialogue.chars().count() as u64;
        stats.word_count += words;
        stats.char_count += chars;
        stats.line_count += 1;

        if let Some(speaker_stats) = speaker_stats {
            speaker_stats.lines += 1;
            speaker_stats.words += words;
            speaker_stats.chars += chars;
        }
    }

    /// 📝 Parse and fold a raw line. Returns `false` (and folds nothing) if it isn't dialogue.
    pub fn fold_line(&mut self, raw: &str) -> bool {
        match parse_line(raw) {
            Some(record) => {
                self.fold(record);
                true
            }
            None => {
                self.skipped_lines += 1;
                false
            }
        }
    }

    /// 📄 Fold every line of a newline-delimited page. Returns how many were dialogue.
    pub fn fold_page(&mut self, page: &str) -> u64 {
        page_lines(page)
            .map(|line| u64::from(self.fold_line(line)))
            .sum()
    }

    pub fn lines_folded(&self) -> u64 {
        self.stats.line_count
    }

    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// 🏁 Hand over the accumulator. The aggregator is consumed; no further folds possible.
    pub fn finish(self) -> PartialStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DistinctSet;

    fn exact_set(items: &[&str]) -> DistinctSet {
        let mut set = DistinctSet::default();
        for item in items {
            set.insert(item);
        }
        set
    }

    #[test]
    fn the_one_where_the_classic_scene_adds_up() {
        let mut aggregator = LocalAggregator::default();
        for line in ["JOHN: Hello there!", "MARY: Hi John, hi!", "", "JOHN: Goodbye."] {
            aggregator.fold_line(line);
        }
        assert_eq!(aggregator.skipped_lines(), 1);

        let stats = aggregator.finish();
        assert_eq!(stats.line_count, 3);
        assert_eq!(stats.word_count, 6);
        assert_eq!(
            stats.char_count,
            ("Hello there!".len() + "Hi John, hi!".len() + "Goodbye.".len()) as u64
        );
        assert_eq!(stats.unique_words, exact_set(&["hello", "there", "hi", "john", "goodbye"]));
        assert_eq!(stats.speaking_characters, exact_set(&["JOHN", "MARY"]));
        assert!(stats.speakers.is_empty(), "breakdown is off by default");
    }

    #[test]
    fn the_one_where_malformed_lines_contribute_nothing_at_all() {
        let mut aggregator = LocalAggregator::default();
        assert!(!aggregator.fold_line("INT. KITCHEN - DAY"));
        assert!(!aggregator.fold_line("    "));
        assert_eq!(aggregator.finish(), PartialStats::default());
    }

    #[test]
    fn the_one_where_the_nameless_speaker_gets_counted() {
        let mut aggregator = LocalAggregator::default();
        assert!(aggregator.fold_line(": nothing"));
        let stats = aggregator.finish();
        assert_eq!(stats.line_count, 1);
        assert_eq!(stats.word_count, 1);
        assert_eq!(stats.char_count, 7);
        assert_eq!(stats.speaking_characters, exact_set(&[""]));
        assert_eq!(stats.speaking_characters.count(), 1);
    }

    #[test]
    fn the_one_where_numbers_count_as_chars_but_not_words() {
        let mut aggregator = LocalAggregator::default();
        aggregator.fold_line("ROBOT: Hello, World! 123");
        let stats = aggregator.finish();
        assert_eq!(stats.word_count, 2);
        assert_eq!(stats.char_count, "Hello, World! 123".len() as u64);
        assert_eq!(stats.unique_words, exact_set(&["hello", "world"]));
    }

    #[test]
    fn the_one_where_fold_page_matches_fold_line_by_line() {
        let page = "JOHN: Hello there!\nMARY: Hi John, hi!\n\nJOHN: Goodbye.";
        let mut by_page = LocalAggregator::default();
        assert_eq!(by_page.fold_page(page), 3);

        let mut by_line = LocalAggregator::default();
        for line in page.split('\n') {
            by_line.fold_line(line);
        }
        assert_eq!(by_page.finish(), by_line.finish());
    }

    #[test]
    fn the_one_where_case_variants_are_different_speakers() {
        let mut aggregator = LocalAggregator::default();
        aggregator.fold_page("JOHN: hi\nJohn: hi\njohn: hi");
        assert_eq!(aggregator.finish().speaking_characters.count(), 3);
    }

    #[test]
    fn the_one_where_the_speaker_breakdown_tracks_each_voice() {
        let mut aggregator = LocalAggregator::new(DistinctCounting::Exact, true);
        aggregator.fold_page("JOHN: Hello there!\nMARY: Hi John, hi!\nJOHN: Goodbye.");
        let stats = aggregator.finish();

        let john = &stats.speakers["JOHN"];
        assert_eq!(john.lines, 2);
        assert_eq!(john.words, 3);
        assert_eq!(john.chars, ("Hello there!".len() + "Goodbye.".len()) as u64);

        let mary = &stats.speakers["MARY"];
        assert_eq!(mary.lines, 1);
        assert_eq!(mary.word_frequencies.get("hi"), Some(&2));
        assert_eq!(mary.word_frequencies.get("john"), Some(&1));
    }

    #[test]
    fn the_one_where_approximate_mode_still_counts_the_small_stuff_right() {
        let mut aggregator =
            LocalAggregator::new(DistinctCounting::Approximate { precision: 14 }, false);
        aggregator.fold_page("JOHN: Hello there!\nMARY: Hi John, hi!\nJOHN: Goodbye.");
        let finished = aggregator.finish().finish();
        assert_eq!(finished.total_lines, 3);
        assert_eq!(finished.total_words, 6);
        assert_eq!(finished.unique_words, 5);
        assert_eq!(finished.speaking_characters, 2);
    }
}
