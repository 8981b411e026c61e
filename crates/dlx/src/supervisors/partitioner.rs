//! 🔀 Partitioner: decides which shard gets which lines.
//!
//! Every line lands in exactly one shard. That is the only promise made here, and the only
//! one the merge needs: counters add, sets union, so *which* shard saw a line never
//! changes the report.
//!
//! - `round_robin`: whole pages rotate across shards. Zero parsing, contiguous blocks.
//! - `hash`: each line goes to `xxh64(line) % shard_count`. Identical lines always share a
//!   shard, so duplicates collapse before the merge ever sees them.

use anyhow::{Result, anyhow};
use async_channel::Sender;
use xxhash_rust::xxh64::xxh64;

use crate::app_config::PartitionStrategy;
use crate::common::{Page, page_lines};

/// 🎯 Stable shard for a line. Same line, same shard, every run.
pub(crate) fn shard_for_line(line: &str, shard_count: usize) -> usize {
    (xxh64(line.as_bytes(), 0) % shard_count as u64) as usize
}

#[derive(Debug)]
pub(crate) struct Partitioner {
    senders: Vec<Sender<Page>>,
    strategy: PartitionStrategy,
    next_shard: usize,
}

impl Partitioner {
    pub(crate) fn new(senders: Vec<Sender<Page>>, strategy: PartitionStrategy) -> Self {
        Self {
            senders,
            strategy,
            next_shard: 0,
        }
    }

    pub(crate) fn shard_count(&self) -> usize {
        self.senders.len()
    }

    /// 📬 Route one page. Waits while the target channel is full.
    pub(crate) async fn dispatch(&mut self, page: Page) -> Result<()> {
        match self.strategy {
            PartitionStrategy::RoundRobin => {
                let shard = self.next_shard;
                self.next_shard = (shard + 1) % self.senders.len();
                self.send(shard, page).await
            }
            PartitionStrategy::Hash => {
                let mut buckets = vec![String::new(); self.senders.len()];
                for line in page_lines(&page) {
                    let bucket = &mut buckets[shard_for_line(line, self.senders.len())];
                    if !bucket.is_empty() {
                        bucket.push('\n');
                    }
                    bucket.push_str(line);
                }
                for (shard, bucket) in buckets.into_iter().enumerate() {
                    if !bucket.is_empty() {
                        self.send(shard, bucket).await?;
                    }
                }
                Ok(())
            }
        }
    }

    async fn send(&self, shard: usize, page: Page) -> Result<()> {
        let sender = self
            .senders
            .get(shard)
            .ok_or_else(|| anyhow!("💀 there is no shard {shard}. the partitioner can't count."))?;
        sender.send(page).await.map_err(|_| {
            anyhow!("💀 shard {shard} hung up mid-delivery. Its channel is closed, so the shard is gone.")
        })
    }
}
