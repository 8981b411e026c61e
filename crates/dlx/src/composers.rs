// ai
//! 🎬 *[the shards are merged. the numbers are final. the sink hungers.]*
//! *["Compose me," whispers the FinalStats. "Make me legible."]*
//!
//! 🎼 The Composers module: turns the final statistics record into the bytes a sink writes.
//!
//! 🧠 Knowledge graph:
//! - **Text** (`TextComposer`): one `key<TAB>value` line per statistic, in report order.
//!   The shape a Hadoop counters job leaves in its output directory. Optional speaker
//!   table after a blank line.
//! - **JSON** (`JsonComposer`): one pretty-printed object. Keys are the exact statistic names.
//! - Resolution: from `SinkConfig`, same pattern as the backends. The format is decided by
//!   where the report is going. InMemory always wants JSON, because tests parse it.
//!
//! ```text
//!   reduce → FinalStats → composer.compose(&stats) → sink.send(payload) → sink.close()
//! ```
//!
//! 🦆 (the duck composes... symphonies? reports? both? the duck has no comment.)

use std::fmt::Write as _;

use anyhow::{Context, Result};

use crate::app_config::SinkConfig;
use crate::backends::OutputFormat;
use crate::stats::{FinalStats, SpeakerSummary};

// ===== Trait =====

/// 🎼 Renders a finished report into the sink's payload.
///
/// Trait → concrete impls → enum dispatcher → from_config resolver. Same shape as
/// `Source`/`Sink`, because once you've learned one dance you might as well keep dancing.
pub(crate) trait Composer: std::fmt::Debug {
    fn compose(&self, stats: &FinalStats) -> Result<String>;
}

// ===== Text Composer =====

/// 📜 `Total Lines Processed\t3` and friends, one per line, trailing newline included.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextComposer;

impl Composer for TextComposer {
    fn compose(&self, stats: &FinalStats) -> Result<String> {
        let mut payload = String::with_capacity(256);
        for (key, value) in stats.named_values() {
            writeln!(payload, "{key}\t{value}")?;
        }

        if let Some(speakers) = &stats.speakers {
            payload.push('\n');
            payload.push_str("Speaker\tLines\tWords\tCharacters\tUnique Words\tTop Words\n");
            for summary in speakers {
                write_speaker_row(&mut payload, summary)?;
            }
        }
        Ok(payload)
    }
}

fn write_speaker_row(payload: &mut String, summary: &SpeakerSummary) -> std::fmt::Result {
    let top_words = summary
        .top_words
        .iter()
        .map(|word_count| format!("{}:{}", word_count.word, word_count.count))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(
        payload,
        "{}\t{}\t{}\t{}\t{}\t{}",
        summary.speaker,
        summary.lines,
        summary.words,
        summary.characters,
        summary.unique_words,
        top_words
    )
}

// ===== JSON Composer =====

/// 📦 Pretty JSON object, trailing newline. serde does the framing this time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct JsonComposer;

impl Composer for JsonComposer {
    fn compose(&self, stats: &FinalStats) -> Result<String> {
        let mut payload = serde_json::to_string_pretty(stats)
            .context("💀 The statistics refused to become JSON. Numbers. Refusing. Somehow.")?;
        payload.push('\n');
        Ok(payload)
    }
}

// ===== Dispatcher Enum =====

/// 🎭 The polymorphic composer: wraps concrete composers, dispatches via match.
#[derive(Debug, Clone)]
pub(crate) enum ComposerBackend {
    Text(TextComposer),
    Json(JsonComposer),
}

impl ComposerBackend {
    pub(crate) fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text(TextComposer),
            OutputFormat::Json => Self::Json(JsonComposer),
        }
    }

    /// 🔧 Resolve the composer from the sink config.
    ///
    /// | SinkConfig | Composer |
    /// |---|---|
    /// | File | per `format` (default text) |
    /// | Stdout | per `format` (default text) |
    /// | InMemory | JsonComposer |
    pub(crate) fn from_sink_config(sink: &SinkConfig) -> Self {
        match sink {
            SinkConfig::File(config) => Self::from_format(config.common_config.format),
            SinkConfig::Stdout(config) => Self::from_format(config.common_config.format),
            SinkConfig::InMemory(()) => Self::Json(JsonComposer),
        }
    }
}

impl Composer for ComposerBackend {
    #[inline]
    fn compose(&self, stats: &FinalStats) -> Result<String> {
        match self {
            Self::Text(c) => c.compose(stats),
            Self::Json(c) => c.compose(stats),
        }
    }
}
