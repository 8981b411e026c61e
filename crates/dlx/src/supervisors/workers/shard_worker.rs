//! 🎬 *[a channel fills with pages. somewhere, a shard waits.]*
//! *[the clock on the wall reads 2:47am.]*
//!
//! 🧺 The ShardWorker: patient, tireless, and deeply unbothered by the chaos upstream.
//! It receives pages. It folds pages. It owns exactly one `LocalAggregator` and shares
//! it with nobody. When the channel closes it hands back a `PartialStats` and is never
//! heard from again.
//!
//! 🦆 (the duck has no comment at this time)

use anyhow::Result;
use async_channel::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::Worker;
use crate::aggregator::LocalAggregator;
use crate::common::Page;
use crate::stats::PartialStats;

#[derive(Debug)]
pub(in crate::supervisors) struct ShardWorker {
    shard_id: usize,
    rx: Receiver<Page>,
    aggregator: LocalAggregator,
}

impl ShardWorker {
    pub(in crate::supervisors) fn new(
        shard_id: usize,
        rx: Receiver<Page>,
        aggregator: LocalAggregator,
    ) -> Self {
        Self {
            shard_id,
            rx,
            aggregator,
        }
    }
}

impl Worker for ShardWorker {
    type Output = PartialStats;

    fn start(mut self) -> JoinHandle<Result<PartialStats>> {
        tokio::spawn(async move {
            debug!("🧺 ShardWorker {} started draining its channel", self.shard_id);
            // -- recv only errors once the channel is empty AND every sender is gone
            while let Ok(page) = self.rx.recv().await {
                let folded = self.aggregator.fold_page(&page);
                trace!("🧺 ShardWorker {} folded {} dialogue lines", self.shard_id, folded);
            }

            debug!(
                "🏁 ShardWorker {}: channel closed. {} lines folded, {} skipped.",
                self.shard_id,
                self.aggregator.lines_folded(),
                self.aggregator.skipped_lines()
            );
            Ok(self.aggregator.finish())
        })
    }
}
