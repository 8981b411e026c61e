//! 🚀 dlx-cli: the front door, the bouncer, the maitre d' of dlx.
//!
//! 🎬 *[narrator voice]* "It all started with a screenplay and a simple question: who talks the most?"
//! 📦 This binary is the thin wrapper that parses flags, sets up logging, loads config,
//! and then lets the library do the heavy lifting. Like a manager. 🦆
//!
//! ```text
//! dlx-cli [--config FILE] [--shards N] [--format text|json] [--approximate[=P]] [--speakers] [INPUT] [OUTPUT]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use dlx::app_config::{
    CommonSinkConfig, CommonSourceConfig, ConfigOverrides, DistinctCounting, FileSinkConfig,
    FileSourceConfig, OutputFormat, SinkConfig, SourceConfig, StdoutSinkConfig,
};
use dlx::FinalStats;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// 🔧 the ol' reliable: picked up from the working directory if it's there
const DEFAULT_CONFIG_FILE: &str = "dlx.toml";

/// 🎬 Count lines, words, characters, unique words and speakers in screenplay dialogue.
#[derive(Debug, Parser)]
#[command(name = "dlx-cli", version, about)]
struct Cli {
    /// Screenplay text file, one `SPEAKER: dialogue` per line (`.gz` is fine too)
    input: Option<PathBuf>,

    /// Where the report goes. `-` means stdout. Omit it to use the config (or stdout).
    output: Option<String>,

    /// TOML config file. Defaults to ./dlx.toml when present.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of parallel shards
    #[arg(short, long, value_name = "N")]
    shards: Option<usize>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Count distinct words/speakers with a HyperLogLog sketch of the given precision
    #[arg(
        long,
        value_name = "PRECISION",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "14"
    )]
    approximate: Option<u8>,

    /// Include per-speaker lines, words, characters and top words
    #[arg(long)]
    speakers: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    /// 🎟️ Everything the user typed, as config overrides. Unset flags stay `None`.
    fn overrides(&self) -> ConfigOverrides {
        let format = self.format.map(OutputFormat::from);
        let sink_common = CommonSinkConfig {
            format: format.unwrap_or_default(),
        };

        ConfigOverrides {
            source_config: self.input.as_ref().map(|input| {
                SourceConfig::File(FileSourceConfig {
                    file_name: input.display().to_string(),
                    common_config: CommonSourceConfig::default(),
                })
            }),
            sink_config: self.output.as_deref().map(|output| match output {
                "-" => SinkConfig::Stdout(StdoutSinkConfig {
                    common_config: sink_common.clone(),
                }),
                path => SinkConfig::File(FileSinkConfig {
                    file_name: path.to_string(),
                    common_config: sink_common.clone(),
                }),
            }),
            shard_count: self.shards,
            distinct_counting: self
                .approximate
                .map(|precision| DistinctCounting::Approximate { precision }),
            speaker_breakdown: self.speakers.then_some(true),
            format,
        }
    }

    /// 🔒 An explicit `--config` must exist. The implicit default only counts if it does.
    fn config_file(&self) -> Result<Option<PathBuf>> {
        match &self.config {
            Some(path) => {
                let exists = path.try_exists().with_context(|| {
                    format!(
                        "💀 Couldn't check whether the config file exists. Was checking here: '{}'",
                        path.display()
                    )
                })?;
                anyhow::ensure!(
                    exists,
                    "💀 Configuration file '{}' does not exist. If it's a relative path, \
                     double-check your working directory, or use an absolute path to be absolutely certain.",
                    path.display()
                );
                Ok(Some(path.clone()))
            }
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                Ok(default.is_file().then(|| default.to_path_buf()))
            }
        }
    }
}

/// 🍽️ The final numbers, in a table, on stderr (stdout may be carrying the report itself).
fn summary_table(final_stats: &FinalStats) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Statistic", "Value"]);
    for (key, value) in final_stats.named_values() {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

async fn run(cli: Cli) -> Result<FinalStats> {
    let config_file = cli.config_file()?;
    let app_config =
        dlx::app_config::load_config_with_overrides(config_file.as_deref(), cli.overrides())
            .context("💀 Couldn't assemble a configuration from the config file, environment and flags")?;
    info!("🎬 {:#?}", app_config.runtime);
    dlx::run(app_config).await
}

/// 🚀 main(): where it all begins.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args
/// 3. Load config and run the pipeline
/// 4. Print the summary, or the whole sad chain of causes and exit 1
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(final_stats) => {
            eprintln!("{}", summary_table(&final_stats));
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🧅 peel the onion of sadness, one layer at a time
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_the_flags_parse_like_the_usage_line_says() {
        let cli = Cli::try_parse_from([
            "dlx-cli",
            "--shards",
            "8",
            "--format",
            "json",
            "--approximate",
            "--speakers",
            "script.txt",
            "stats.json",
        ])
        .expect("💀 the documented flags should parse");

        let overrides = cli.overrides();
        assert_eq!(overrides.shard_count, Some(8));
        assert_eq!(
            overrides.distinct_counting,
            Some(DistinctCounting::Approximate { precision: 14 })
        );
        assert_eq!(overrides.speaker_breakdown, Some(true));
        assert_eq!(
            overrides.sink_config,
            Some(SinkConfig::File(FileSinkConfig {
                file_name: "stats.json".into(),
                common_config: CommonSinkConfig {
                    format: OutputFormat::Json
                },
            }))
        );
    }

    #[test]
    fn the_one_where_a_dash_means_stdout_and_precision_can_be_picked() {
        let cli = Cli::try_parse_from(["dlx-cli", "--approximate=10", "script.txt.gz", "-"])
            .expect("💀 should parse");
        let overrides = cli.overrides();
        assert_eq!(
            overrides.distinct_counting,
            Some(DistinctCounting::Approximate { precision: 10 })
        );
        assert_eq!(
            overrides.sink_config,
            Some(SinkConfig::Stdout(StdoutSinkConfig::default()))
        );
        assert_eq!(overrides.speaker_breakdown, None, "unset flags stay out of the way");
    }

    #[test]
    fn the_one_where_an_explicit_config_file_has_to_exist() {
        let cli = Cli::try_parse_from(["dlx-cli", "--config", "/no/such/dlx.toml"])
            .expect("💀 should parse");
        assert!(cli.config_file().is_err());
    }
}
