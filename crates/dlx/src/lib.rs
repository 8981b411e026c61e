// ai
//! 🎬 dlx: dialogue statistics for screenplays, sharded and merged.
//!
//! Feed it `SPEAKER: dialogue` lines. Get back five numbers: total lines, total words,
//! total characters, distinct normalized words, distinct speakers. Malformed lines are
//! skipped, not fatal. However many shards you throw at it, the numbers stay the same.
//!
//! ```text
//!   lines → parse → normalize → fold (per shard) → merge (tree or streaming) → FinalStats
//! ```
//!
//! Two ways in:
//! - [`run`]: the full pipeline from an [`AppConfig`]: source backend, sink backend, report.
//! - [`aggregate_lines`]: lines already in memory, stats straight back. No sink.
//!
//! 🦆 the duck counts words. the duck does not count itself.

pub mod aggregator;
pub mod app_config;
pub(crate) mod backends;
pub(crate) mod common;
pub(crate) mod composers;
pub mod dialogue;
pub mod merger;
pub(crate) mod progress;
pub mod stats;
pub(crate) mod supervisors;
pub mod words;

use anyhow::Result;

pub use crate::app_config::{AppConfig, RuntimeConfig};
pub use crate::stats::FinalStats;
use crate::app_config::InMemorySourceConfig;
use crate::backends::SourceBackend;
use crate::backends::in_mem::InMemorySource;
use crate::supervisors::Supervisor;

/// 🚀 Run the configured pipeline end to end. The report lands in the configured sink
/// and is also returned. On error the sink receives nothing.
pub async fn run(app_config: AppConfig) -> Result<FinalStats> {
    Supervisor::new(app_config).run().await
}

/// 🧺 Aggregate lines already in memory across `runtime.shard_count` shards.
pub async fn aggregate_lines<I, S>(lines: I, runtime: RuntimeConfig) -> Result<FinalStats>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let source = InMemorySource::new(InMemorySourceConfig::from_lines(lines)).await?;
    let merged = supervisors::aggregate(SourceBackend::InMemory(source), &runtime).await?;
    Ok(merged.finish())
}
