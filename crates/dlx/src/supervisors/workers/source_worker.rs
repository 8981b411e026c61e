//! 🚰 The SourceWorker: one task, one source, every page.
//!
//! It never looks inside a page. The partitioner decides who gets what, and when the
//! source says `None` the worker returns, the partitioner drops, and every shard channel
//! closes behind it. That closing is the "no more input" signal the shards wait for.

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::Worker;
use crate::backends::{Source, SourceBackend};
use crate::supervisors::partitioner::Partitioner;

/// 📋 What the source worker saw on its way through.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(in crate::supervisors) struct SourceSummary {
    pub(in crate::supervisors) pages: u64,
    pub(in crate::supervisors) bytes: u64,
}

#[derive(Debug)]
pub(in crate::supervisors) struct SourceWorker {
    source: SourceBackend,
    partitioner: Partitioner,
}

impl SourceWorker {
    pub(in crate::supervisors) fn new(source: SourceBackend, partitioner: Partitioner) -> Self {
        Self {
            source,
            partitioner,
        }
    }
}

impl Worker for SourceWorker {
    type Output = SourceSummary;

    fn start(mut self) -> JoinHandle<Result<SourceSummary>> {
        tokio::spawn(async move {
            debug!(
                "🚰 SourceWorker started pouring pages into {} shards",
                self.partitioner.shard_count()
            );
            let mut summary = SourceSummary::default();

            while let Some(page) = self
                .source
                .next_page()
                .await
                .context("💀 SourceWorker could not read the next page")?
            {
                summary.pages += 1;
                summary.bytes += page.len() as u64;
                self.partitioner
                    .dispatch(page)
                    .await
                    .context("💀 SourceWorker could not hand a page to the shards")?;
            }

            info!(
                "🏁 SourceWorker: source ran dry after {} pages ({} bytes). Closing shard channels.",
                summary.pages, summary.bytes
            );
            // -- partitioner drops here with self, and every sender with it
            Ok(summary)
        })
    }
}
