//! 🧵 Workers: the ones who actually do the work while the Supervisor takes all the
//! credit in the sprint retro.
//!
//! 🧠 Knowledge graph:
//! - `SourceWorker` (exactly one): pulls pages from the `Source`, hands each one to the
//!   `Partitioner`, and drops every channel sender when the source runs dry.
//! - `ShardWorker` (one per shard): drains its own channel into its own `LocalAggregator`,
//!   and returns the finished `PartialStats` once the channel closes.
//! - Neither kind shares mutable state with anyone. Channels in, `JoinHandle` out.
//!
//! 🦆 "What's the DEAL with lifetime annotations? You borrow something, you give it back."

use anyhow::Result;
use tokio::task::JoinHandle;

mod shard_worker;
mod source_worker;

pub(super) use shard_worker::ShardWorker;
pub(super) use source_worker::SourceWorker;

/// 🏗️ A background worker, that does work. duh.
///
/// `start` spawns the worker onto the runtime and hands back the only way to find out
/// how it went. Whatever it produces comes back through the handle.
pub(super) trait Worker {
    type Output: Send + 'static;

    fn start(self) -> JoinHandle<Result<Self::Output>>;
}
