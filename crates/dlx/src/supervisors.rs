//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where shards toil endlessly..."
//! 🎬 "One supervisor dared to merge them all."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor module: part middle manager, part helicopter parent.
//!
//! 🧠 Knowledge graph:
//! ```text
//!   Source ──▶ SourceWorker ──▶ Partitioner ─┬─▶ channel ─▶ ShardWorker 0 ─┐
//!                                            ├─▶ channel ─▶ ShardWorker 1 ─┼─▶ merge ─▶ FinalStats
//!                                            └─▶ channel ─▶ ShardWorker N ─┘      │
//!                                                                 Composer ◀──────┘──▶ Sink
//! ```
//! - Fork: one shard task per `runtime.shard_count`, each with a bounded channel.
//! - Join: shard handles are polled in completion order. `tree` collects then reduces
//!   pairwise, `streaming` folds each result in as it arrives.
//! - All-or-nothing: the first failure aborts every task still running, and the sink
//!   never sees a byte.
//!
//! ⚠️ DO NOT MAKE THIS PUB EVER. Workers are the supervisor's private little minions.

mod partitioner;
mod workers;

use anyhow::{Context, Result};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::aggregator::LocalAggregator;
use crate::app_config::{AppConfig, RuntimeConfig};
use crate::backends::{Sink, SinkBackend, SourceBackend};
use crate::composers::{Composer, ComposerBackend};
use crate::merger::{MergeTopology, merge_into, reduce_tree};
use crate::stats::{FinalStats, PartialStats};
use partitioner::Partitioner;
use workers::{ShardWorker, SourceWorker, Worker};

/// 📦 The Supervisor: owns the config, builds the backends, runs the fork/join.
pub(crate) struct Supervisor {
    app_config: AppConfig,
}

impl Supervisor {
    pub(crate) fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }

    /// 🚀 The whole job: open the source, aggregate, render, deliver.
    pub(crate) async fn run(&self) -> Result<FinalStats> {
        self.app_config.runtime.validate()?;
        let source = SourceBackend::from_config(&self.app_config.source_config)
            .await
            .context("💀 Could not open the input")?;
        let sink = SinkBackend::from_config(&self.app_config.sink_config)
            .await
            .context("💀 Could not open the output")?;
        let composer = ComposerBackend::from_sink_config(&self.app_config.sink_config);
        self.run_with(source, sink, composer).await
    }

    /// 🧪 Same as `run`, with the backends handed in. The sink is only touched on success.
    pub(crate) async fn run_with(
        &self,
        source: SourceBackend,
        mut sink: SinkBackend,
        composer: ComposerBackend,
    ) -> Result<FinalStats> {
        let final_stats = aggregate(source, &self.app_config.runtime).await?.finish();

        let payload = composer
            .compose(&final_stats)
            .context("💀 Could not render the report")?;
        sink.send(payload)
            .await
            .context("💀 Could not deliver the report to the sink")?;
        sink.close()
            .await
            .context("💀 Could not close the sink")?;

        info!(
            "🏆 {} lines, {} words, {} characters, {} unique words, {} speakers",
            final_stats.total_lines,
            final_stats.total_words,
            final_stats.total_characters,
            final_stats.unique_words,
            final_stats.speaking_characters
        );
        Ok(final_stats)
    }
}

/// 🧵 Fork one task per shard plus the source task, then join through the merge.
///
/// Returns the merged `PartialStats` over every line the source produced, or the first
/// error. On error nothing is returned at all, not even the shards that did finish.
pub(crate) async fn aggregate(
    source: SourceBackend,
    runtime: &RuntimeConfig,
) -> Result<PartialStats> {
    runtime.validate()?;
    debug!(
        "🧵 forking {} shards ({:?} partition, {:?} merge, queue capacity {})",
        runtime.shard_count, runtime.partition, runtime.merge_topology, runtime.queue_capacity
    );

    let mut senders = Vec::with_capacity(runtime.shard_count);
    let mut shard_aborts = Vec::with_capacity(runtime.shard_count);
    let mut shard_handles = FuturesUnordered::new();
    for shard_id in 0..runtime.shard_count {
        let (tx, rx) = async_channel::bounded(runtime.queue_capacity);
        senders.push(tx);
        let aggregator =
            LocalAggregator::new(runtime.distinct_counting, runtime.speaker_breakdown);
        let handle = ShardWorker::new(shard_id, rx, aggregator).start();
        shard_aborts.push(handle.abort_handle());
        shard_handles.push(handle);
    }

    let source_handle =
        SourceWorker::new(source, Partitioner::new(senders, runtime.partition)).start();

    let merged = match join_shards(shard_handles, &shard_aborts, runtime).await {
        Ok(merged) => merged,
        Err(err) => {
            source_handle.abort();
            return Err(err);
        }
    };

    // -- every shard finished cleanly, which only tells us the channels closed. ask the source why.
    let summary = source_handle
        .await
        .context("💀 The source worker panicked")?
        .context("💀 The source failed, so there is no report")?;
    debug!(
        "🚰 source delivered {} pages / {} bytes",
        summary.pages, summary.bytes
    );
    Ok(merged)
}

/// 🤝 Join every shard and merge by topology. The first failure or panic aborts every
/// shard still running, and nothing that already finished is returned.
async fn join_shards(
    shard_handles: FuturesUnordered<JoinHandle<Result<PartialStats>>>,
    shard_aborts: &[AbortHandle],
    runtime: &RuntimeConfig,
) -> Result<PartialStats> {
    match merge_shards(shard_handles, runtime).await {
        Ok(merged) => Ok(merged),
        Err(err) => {
            warn!("💀 a shard went down. aborting every shard still standing.");
            abort_all(shard_aborts);
            Err(err)
        }
    }
}

async fn merge_shards(
    mut shard_handles: FuturesUnordered<JoinHandle<Result<PartialStats>>>,
    runtime: &RuntimeConfig,
) -> Result<PartialStats> {
    let mut finished = Vec::with_capacity(shard_handles.len());
    let mut running: Option<PartialStats> = None;

    while let Some(joined) = shard_handles.next().await {
        let part = joined.context("💀 A shard worker panicked")??;
        match runtime.merge_topology {
            MergeTopology::Tree => finished.push(part),
            MergeTopology::Streaming => match running.as_mut() {
                Some(acc) => merge_into(acc, part),
                None => running = Some(part),
            },
        }
    }

    let merged = match runtime.merge_topology {
        MergeTopology::Tree => reduce_tree(finished),
        MergeTopology::Streaming => running.unwrap_or_default(),
    };
    Ok(merged)
}

fn abort_all(handles: &[AbortHandle]) {
    for handle in handles {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::{PartitionStrategy, SinkConfig, SourceConfig};
    use crate::backends::in_mem::{InMemorySink, InMemorySource};
    use crate::backends::{
        CommonSinkConfig, CommonSourceConfig, FileSinkConfig, FileSourceConfig,
        InMemorySourceConfig, OutputFormat,
    };
    use crate::stats::DistinctCounting;

    const SCREENPLAY: &[&str] = &[
        "JOHN: Hello there!",
        "MARY: Hi John, hi!",
        "",
        "JOHN: Goodbye.",
        "INT. KITCHEN - DAY",
        ": nothing",
        "BOB: Hello, World! 123",
        "MARY: Time: 10:30, sharp.",
        "John: What's up?",
        "JOHN: Hello there!",
        "   ",
        "NARRATOR:",
        "MARY: it's the dog's bone",
    ];

    async fn in_memory_source(lines: &[&str], page_lines: usize) -> Result<SourceBackend> {
        let mut config = InMemorySourceConfig::from_lines(lines.iter().copied());
        config.common_config.max_batch_size_lines = page_lines;
        Ok(SourceBackend::InMemory(InMemorySource::new(config).await?))
    }

    fn single_fold(lines: &[&str], runtime: &RuntimeConfig) -> PartialStats {
        let mut aggregator =
            LocalAggregator::new(runtime.distinct_counting, runtime.speaker_breakdown);
        for line in lines {
            aggregator.fold_line(line);
        }
        aggregator.finish()
    }

    #[tokio::test]
    async fn the_one_where_the_shard_count_never_changes_the_answer() -> Result<()> {
        for partition in [PartitionStrategy::RoundRobin, PartitionStrategy::Hash] {
            for merge_topology in [MergeTopology::Tree, MergeTopology::Streaming] {
                for shard_count in 1..=6 {
                    for page_lines in [1, 2, 5, 100] {
                        let runtime = RuntimeConfig {
                            shard_count,
                            queue_capacity: 1,
                            partition,
                            merge_topology,
                            speaker_breakdown: true,
                            ..Default::default()
                        };
                        let expected = single_fold(SCREENPLAY, &runtime);
                        let source = in_memory_source(SCREENPLAY, page_lines).await?;
                        let merged = aggregate(source, &runtime).await?;
                        assert_eq!(
                            merged, expected,
                            "{partition:?}/{merge_topology:?} with {shard_count} shards and {page_lines}-line pages"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_screenplay_adds_up_end_to_end() -> Result<()> {
        let runtime = RuntimeConfig {
            shard_count: 3,
            ..Default::default()
        };
        let lines = ["JOHN: Hello there!", "MARY: Hi John, hi!", "", "JOHN: Goodbye."];
        let final_stats = aggregate(in_memory_source(&lines, 1).await?, &runtime)
            .await?
            .finish();
        assert_eq!(
            final_stats.named_values().map(|(_, value)| value),
            [3, 6, 32, 5, 2]
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_nothing_goes_in_and_zeros_come_out() -> Result<()> {
        for distinct_counting in [
            DistinctCounting::Exact,
            DistinctCounting::Approximate { precision: 12 },
        ] {
            let runtime = RuntimeConfig {
                distinct_counting,
                ..Default::default()
            };
            let final_stats = aggregate(in_memory_source(&[], 10).await?, &runtime)
                .await?
                .finish();
            assert_eq!(final_stats.named_values().map(|(_, value)| value), [0; 5]);
        }
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_approximate_sharding_agrees_with_itself() -> Result<()> {
        // -- sketches merge by register max, so shard layout can't move the estimate
        let single = RuntimeConfig {
            shard_count: 1,
            distinct_counting: DistinctCounting::Approximate { precision: 10 },
            ..Default::default()
        };
        let expected = aggregate(in_memory_source(SCREENPLAY, 100).await?, &single).await?;
        for shard_count in 2..=5 {
            let runtime = RuntimeConfig {
                shard_count,
                partition: PartitionStrategy::Hash,
                ..single.clone()
            };
            let merged = aggregate(in_memory_source(SCREENPLAY, 2).await?, &runtime).await?;
            assert_eq!(merged, expected, "{shard_count} approximate shards");
        }
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_zero_shards_never_gets_off_the_ground() -> Result<()> {
        let runtime = RuntimeConfig {
            shard_count: 0,
            ..Default::default()
        };
        let err = aggregate(in_memory_source(SCREENPLAY, 2).await?, &runtime)
            .await
            .expect_err("💀 zero shards must be rejected");
        assert!(format!("{err:#}").contains("shard_count"));
        Ok(())
    }

    async fn trips_over_a_cable() -> Result<PartialStats> {
        Err(anyhow::anyhow!("💀 shard 1 tripped over a cable"))
    }

    async fn leaves_the_building() -> Result<PartialStats> {
        panic!("💀 shard 2 has left the building")
    }

    #[tokio::test]
    async fn the_one_where_one_bad_shard_takes_the_whole_run_down() -> Result<()> {
        let (alive_tx, alive_rx) = async_channel::bounded::<()>(1);
        let handles: Vec<JoinHandle<Result<PartialStats>>> = vec![
            // -- a survivor that would wait forever. it holds the sender until it's dropped.
            tokio::spawn(async move {
                let _alive = alive_tx;
                std::future::pending::<()>().await;
                Ok(PartialStats::default())
            }),
            tokio::spawn(trips_over_a_cable()),
            tokio::spawn(leaves_the_building()),
        ];
        let aborts: Vec<AbortHandle> = handles.iter().map(JoinHandle::abort_handle).collect();
        let shard_handles: FuturesUnordered<_> = handles.into_iter().collect();

        let result = join_shards(shard_handles, &aborts, &RuntimeConfig::default()).await;
        assert!(result.is_err(), "a failed shard means no merged stats at all");

        // -- the sender only goes away if the survivor's task was torn down
        assert!(alive_rx.recv().await.is_err(), "the survivor should have been aborted");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_latin1_byte_does_not_cancel_the_show() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("script.txt");
        std::fs::write(&input, b"JOHN: Hello there!\nMARY: caf\xE9 ok\nJOHN: Goodbye.\n")?;

        let app_config = AppConfig {
            source_config: SourceConfig::File(FileSourceConfig {
                file_name: input.display().to_string(),
                common_config: CommonSourceConfig::default(),
            }),
            sink_config: SinkConfig::InMemory(()),
            runtime: RuntimeConfig::default(),
        };

        let final_stats = Supervisor::new(app_config).run().await?;
        assert_eq!(final_stats.total_lines, 3, "MARY's line is counted, accent and all");
        assert_eq!(final_stats.total_words, 5);
        // -- 12 + 7 + 8: the bad byte is one replacement character
        assert_eq!(final_stats.total_characters, 27);
        assert_eq!(final_stats.unique_words, 5);
        assert_eq!(final_stats.speaking_characters, 2);
        Ok(())
    }

    fn in_memory_app_config(lines: &[&str]) -> AppConfig {
        AppConfig {
            source_config: SourceConfig::InMemory(InMemorySourceConfig::from_lines(
                lines.iter().copied(),
            )),
            sink_config: SinkConfig::InMemory(()),
            runtime: RuntimeConfig::default(),
        }
    }

    #[tokio::test]
    async fn the_one_where_the_sink_gets_exactly_one_json_report() -> Result<()> {
        let app_config = in_memory_app_config(SCREENPLAY);
        let sink = InMemorySink::new().await?;
        let supervisor = Supervisor::new(app_config.clone());
        let final_stats = supervisor
            .run_with(
                SourceBackend::from_config(&app_config.source_config).await?,
                SinkBackend::InMemory(sink.clone()),
                ComposerBackend::from_sink_config(&app_config.sink_config),
            )
            .await?;

        let payloads = sink.payloads().await;
        assert_eq!(payloads.len(), 1, "one report, delivered once");
        let report: serde_json::Value = serde_json::from_str(&payloads[0])?;
        assert_eq!(report["Total Lines Processed"], final_stats.total_lines);
        assert_eq!(report["Number of Characters Speaking"], final_stats.speaking_characters);
        Ok(())
    }

    fn write_gzip_with_trailing_garbage(path: &std::path::Path) -> Result<()> {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"JOHN: Hello there!\nMARY: Hi John, hi!\n")?;
        let mut bytes = encoder.finish()?;
        bytes.extend_from_slice(b"this is not a gzip member");
        std::fs::write(path, bytes)?;
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_failing_source_means_no_report_at_all() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("script.txt.gz");
        let output = dir.path().join("stats.txt");
        write_gzip_with_trailing_garbage(&input)?;

        let app_config = AppConfig {
            source_config: SourceConfig::File(FileSourceConfig {
                file_name: input.display().to_string(),
                common_config: CommonSourceConfig {
                    max_batch_size_lines: 1,
                    ..Default::default()
                },
            }),
            sink_config: SinkConfig::File(FileSinkConfig {
                file_name: output.display().to_string(),
                common_config: CommonSinkConfig::default(),
            }),
            runtime: RuntimeConfig::default(),
        };

        let err = Supervisor::new(app_config)
            .run()
            .await
            .expect_err("💀 a corrupt archive must fail the run");
        assert!(format!("{err:#}").contains("source failed"));
        assert!(!output.exists(), "no report under the final name");
        assert!(!dir.path().join("stats.txt.partial").exists(), "and no leftovers");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_file_pipeline_writes_hadoop_style_text() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("script.txt");
        let output = dir.path().join("stats.txt");
        std::fs::write(&input, "JOHN: Hello there!\nMARY: Hi John, hi!\n\nJOHN: Goodbye.\n")?;

        let app_config = AppConfig {
            source_config: SourceConfig::File(FileSourceConfig {
                file_name: input.display().to_string(),
                common_config: CommonSourceConfig::default(),
            }),
            sink_config: SinkConfig::File(FileSinkConfig {
                file_name: output.display().to_string(),
                common_config: CommonSinkConfig {
                    format: OutputFormat::Text,
                },
            }),
            runtime: RuntimeConfig {
                shard_count: 2,
                ..Default::default()
            },
        };

        Supervisor::new(app_config).run().await?;
        assert_eq!(
            std::fs::read_to_string(&output)?,
            "Total Lines Processed\t3\n\
             Total Words Processed\t6\n\
             Total Characters Processed\t32\n\
             Total Unique Words Identified\t5\n\
             Number of Characters Speaking\t2\n"
        );
        Ok(())
    }
}
