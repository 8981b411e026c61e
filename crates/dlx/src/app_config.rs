//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! Layering, lowest to highest:
//!   1. `DLX_*` env vars (nested keys with `__`, e.g. `DLX_RUNTIME__SHARD_COUNT=8`)
//!   2. the TOML file, if one was given
//!   3. [`ConfigOverrides`] from the command line

use anyhow::{Context, ensure};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::Path;
// 🚀 tracing::info, because println! in production is a cry for help.
use tracing::info;

pub use crate::backends::{
    CommonSinkConfig, CommonSourceConfig, FileSinkConfig, FileSourceConfig,
    InMemorySourceConfig, OutputFormat, StdoutSinkConfig,
};
pub use crate::merger::MergeTopology;
pub use crate::stats::DistinctCounting;
use crate::stats::hll::{MAX_PRECISION, MIN_PRECISION};

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where the screenplay lines come from.
    pub source_config: SourceConfig,
    /// 🕳️ Where the statistics record goes.
    pub sink_config: SinkConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 🚰 Source selection. Externally tagged, so TOML reads `[source_config.File]`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum SourceConfig {
    /// 📂 a text file of dialogue lines (`.gz` files are decompressed on the fly)
    File(FileSourceConfig),
    /// 🧠 lines straight from memory, for tests and embedding
    InMemory(InMemorySourceConfig),
}

/// 🕳️ Sink selection.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum SinkConfig {
    File(FileSinkConfig),
    Stdout(StdoutSinkConfig),
    /// 🧪 keeps rendered payloads in memory (always JSON)
    InMemory(()),
}

/// 🔀 How the source worker spreads lines over shards. Any choice gives the same answer.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// whole pages rotate across shards, contiguous blocks
    #[default]
    RoundRobin,
    /// each line goes to `xxh64(line) % shard_count`
    Hash,
}

/// 🎛️ Runtime knobs: how many shards, how deep the queues, how to count distinct things.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// 🧵 parallel shard workers, one accumulator each
    #[serde(default = "default_shard_count")]
    pub shard_count: usize,
    /// 📬 pages buffered per shard channel before the source worker waits
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub partition: PartitionStrategy,
    #[serde(default)]
    pub merge_topology: MergeTopology,
    #[serde(default)]
    pub distinct_counting: DistinctCounting,
    /// 🗣️ also report per-speaker lines/words/chars/top words
    #[serde(default)]
    pub speaker_breakdown: bool,
}

fn default_shard_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    10
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shard_count: default_shard_count(),
            queue_capacity: default_queue_capacity(),
            partition: PartitionStrategy::default(),
            merge_topology: MergeTopology::default(),
            distinct_counting: DistinctCounting::default(),
            speaker_breakdown: false,
        }
    }
}

impl RuntimeConfig {
    /// ✅ Reject configurations the pipeline can't run before any task is spawned.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.shard_count >= 1,
            "💀 runtime.shard_count must be at least 1. Zero workers aggregate zero lines, and then what?"
        );
        ensure!(
            self.queue_capacity >= 1,
            "💀 runtime.queue_capacity must be at least 1. A channel that holds nothing delivers nothing."
        );
        if let DistinctCounting::Approximate { precision } = self.distinct_counting {
            ensure!(
                (MIN_PRECISION..=MAX_PRECISION).contains(&precision),
                "💀 runtime.distinct_counting.precision must be within {}..={}, got {}",
                MIN_PRECISION,
                MAX_PRECISION,
                precision
            );
        }
        Ok(())
    }
}

/// 🎟️ Values from the command line. Each `Some` replaces whatever env/TOML said.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub source_config: Option<SourceConfig>,
    pub sink_config: Option<SinkConfig>,
    pub shard_count: Option<usize>,
    pub distinct_counting: Option<DistinctCounting>,
    pub speaker_breakdown: Option<bool>,
    /// 🎨 applied to whichever File/Stdout sink wins
    pub format: Option<OutputFormat>,
}

// -- 📋 what figment hands back before the overrides land: source and sink may still be missing
#[derive(Debug, Deserialize)]
struct LayeredConfig {
    source_config: Option<SourceConfig>,
    sink_config: Option<SinkConfig>,
    #[serde(default)]
    runtime: RuntimeConfig,
}

/// 🚀 Load the config from `DLX_*` env vars plus an optional TOML file.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    load_config_with_overrides(config_file_name, ConfigOverrides::default())
}

/// 🚀 Load the config, then let the command line have the last word.
///
/// 📐 If `config_file_name` is None we read env vars only. No file, no assumptions.
/// 📺 No sink anywhere means stdout.
/// 💀 Fails if nothing names a source, or if the runtime knobs are nonsense.
pub fn load_config_with_overrides(
    config_file_name: Option<&Path>,
    overrides: ConfigOverrides,
) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("DLX_").split("__"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (DLX_*). \
             The file exists in our hearts, but apparently not in a shape serde recognizes.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (DLX_*). \
                 No file was provided, so this one's all on the environment."
            .to_string(),
    };
    let layered: LayeredConfig = config.extract().context(context_msg)?;

    let mut runtime = layered.runtime;
    if let Some(shard_count) = overrides.shard_count {
        runtime.shard_count = shard_count;
    }
    if let Some(distinct_counting) = overrides.distinct_counting {
        runtime.distinct_counting = distinct_counting;
    }
    if let Some(speaker_breakdown) = overrides.speaker_breakdown {
        runtime.speaker_breakdown = speaker_breakdown;
    }
    runtime.validate().context("💀 The [runtime] section didn't pass inspection")?;

    let source_config = overrides.source_config.or(layered.source_config).context(
        "💀 No input configured. Pass an INPUT path, or add a [source_config.File] section.",
    )?;
    let sink_config = match overrides.sink_config.or(layered.sink_config) {
        Some(sink_config) => sink_config,
        None => {
            info!("📺 No output configured, the report goes to stdout");
            SinkConfig::Stdout(StdoutSinkConfig::default())
        }
    };
    let sink_config = match overrides.format {
        Some(format) => with_format(sink_config, format),
        None => sink_config,
    };

    Ok(AppConfig {
        source_config,
        sink_config,
        runtime,
    })
}

fn with_format(sink_config: SinkConfig, format: OutputFormat) -> SinkConfig {
    match sink_config {
        SinkConfig::File(mut config) => {
            config.common_config.format = format;
            SinkConfig::File(config)
        }
        SinkConfig::Stdout(mut config) => {
            config.common_config.format = format;
            SinkConfig::Stdout(config)
        }
        // -- in-memory is always JSON
        SinkConfig::InMemory(()) => SinkConfig::InMemory(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("💀 Failed to create a temp config. The filesystem said 'new phone who dis'.");
        file.write_all(contents.as_bytes())
            .expect("💀 Failed to write test config.");
        file
    }

    #[test]
    fn the_one_where_runtime_knobs_move_into_their_own_apartment() {
        let config_file = write_test_config(
            r#"
            [runtime]
            shard_count = 8
            queue_capacity = 3
            partition = "hash"
            merge_topology = "streaming"
            speaker_breakdown = true

            [runtime.distinct_counting]
            strategy = "approximate"
            precision = 12

            [source_config.File]
            file_name = "script.txt"

            [sink_config.File]
            file_name = "stats.txt"
            format = "json"
            "#,
        );

        let app_config = load_config(Some(config_file.path()))
            .expect("💀 Runtime config should parse. The schema drift goblin does not get this win.");

        assert_eq!(app_config.runtime.shard_count, 8);
        assert_eq!(app_config.runtime.queue_capacity, 3);
        assert_eq!(app_config.runtime.partition, PartitionStrategy::Hash);
        assert_eq!(app_config.runtime.merge_topology, MergeTopology::Streaming);
        assert!(app_config.runtime.speaker_breakdown);
        assert_eq!(
            app_config.runtime.distinct_counting,
            DistinctCounting::Approximate { precision: 12 }
        );
        match app_config.sink_config {
            SinkConfig::File(file_config) => {
                assert_eq!(file_config.file_name, "stats.txt");
                assert_eq!(file_config.common_config.format, OutputFormat::Json);
            }
            honestly_who_knows => panic!(
                "💀 Expected File sink config, but serde took us to {:?}. Plot twist energy.",
                honestly_who_knows
            ),
        }
    }

    #[test]
    fn the_one_where_runtime_defaults_show_up_uninvited_but_helpful() {
        let config_file = write_test_config(
            r#"
            [source_config.File]
            file_name = "script.txt"

            [sink_config.Stdout]
            "#,
        );

        let app_config = load_config(Some(config_file.path()))
            .expect("💀 Default runtime config should exist. Serde left us on read otherwise.");

        assert_eq!(app_config.runtime, RuntimeConfig::default());
        assert_eq!(app_config.runtime.shard_count, 4);
        assert_eq!(app_config.runtime.queue_capacity, 10);
        assert_eq!(
            app_config.sink_config,
            SinkConfig::Stdout(StdoutSinkConfig::default())
        );
        match app_config.source_config {
            SourceConfig::File(file_config) => {
                assert_eq!(file_config.common_config.max_batch_size_lines, 1000);
            }
            other => panic!("💀 expected a File source, got {other:?}"),
        }
    }

    #[test]
    fn the_one_where_borrowed_knob_names_are_not_recognized() {
        let config_file = write_test_config(
            r#"
            [supervisor_config]
            shard_count = 2

            [runtime]
            shards = 3
            channel_size = 12

            [source_config.File]
            file_name = "script.txt"
            common_config = { max_batch_size_docs = 5 }

            [sink_config.Stdout]
            "#,
        );

        let app_config = load_config(Some(config_file.path()))
            .expect("💀 unknown keys are ignored, not fatal");

        assert_eq!(app_config.runtime, RuntimeConfig::default(), "only `runtime.*` names count");
        match app_config.source_config {
            SourceConfig::File(file_config) => {
                assert_eq!(file_config.common_config.max_batch_size_lines, 1000);
            }
            other => panic!("💀 expected a File source, got {other:?}"),
        }
    }

    #[test]
    fn the_one_where_the_command_line_gets_the_last_word() {
        let config_file = write_test_config(
            r#"
            [runtime]
            shard_count = 8

            [source_config.File]
            file_name = "from-file.txt"

            [sink_config.Stdout]
            "#,
        );

        let overrides = ConfigOverrides {
            source_config: Some(SourceConfig::File(FileSourceConfig {
                file_name: "from-cli.txt".into(),
                common_config: CommonSourceConfig::default(),
            })),
            shard_count: Some(2),
            distinct_counting: Some(DistinctCounting::Approximate { precision: 10 }),
            ..Default::default()
        };
        let app_config = load_config_with_overrides(Some(config_file.path()), overrides)
            .expect("💀 overrides should apply cleanly");

        assert_eq!(app_config.runtime.shard_count, 2);
        assert_eq!(
            app_config.runtime.distinct_counting,
            DistinctCounting::Approximate { precision: 10 }
        );
        match app_config.source_config {
            SourceConfig::File(file_config) => assert_eq!(file_config.file_name, "from-cli.txt"),
            other => panic!("💀 expected the CLI's File source, got {other:?}"),
        }
    }

    #[test]
    fn the_one_where_zero_shards_is_turned_away_at_the_door() {
        let config_file = write_test_config(
            r#"
            [runtime]
            shard_count = 0

            [source_config.File]
            file_name = "script.txt"

            [sink_config.Stdout]
            "#,
        );

        let err = load_config(Some(config_file.path()))
            .expect_err("💀 zero shards must not load");
        assert!(format!("{err:#}").contains("shard_count"));
    }

    #[test]
    fn the_one_where_silly_precision_is_rejected() {
        let runtime = RuntimeConfig {
            distinct_counting: DistinctCounting::Approximate { precision: 30 },
            ..Default::default()
        };
        assert!(runtime.validate().is_err());
    }

    #[test]
    fn the_one_where_nobody_said_where_the_input_is() {
        let config_file = write_test_config(
            r#"
            [sink_config.Stdout]
            "#,
        );
        let err = load_config(Some(config_file.path()))
            .expect_err("💀 no source should be an error");
        assert!(format!("{err:#}").contains("No input configured"));
    }

    #[test]
    fn the_one_where_no_output_means_stdout_in_the_requested_format() {
        let config_file = write_test_config(
            r#"
            [source_config.File]
            file_name = "script.txt"
            "#,
        );
        let overrides = ConfigOverrides {
            format: Some(OutputFormat::Json),
            ..Default::default()
        };
        let app_config = load_config_with_overrides(Some(config_file.path()), overrides)
            .expect("💀 a missing sink should fall back to stdout");
        assert_eq!(
            app_config.sink_config,
            SinkConfig::Stdout(StdoutSinkConfig {
                common_config: CommonSinkConfig {
                    format: OutputFormat::Json
                }
            })
        );
    }
}
