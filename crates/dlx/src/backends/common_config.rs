// ai
//! 🎬 *[two configs walk into a struct. one sizes the pages. one picks the output format.]*
//! *["We belong together," they said. "In the backends module." The module system nodded.]*
//!
//! 📦 **Common Backend Configs**: the shared DNA of source and sink configuration.
//!
//! 🧠 Knowledge graph:
//! - `CommonSourceConfig`: embedded in every source config (`FileSourceConfig`,
//!   `InMemorySourceConfig`). How big a page do we pour into the shard channels?
//! - `CommonSinkConfig`: embedded in every sink config that writes bytes somewhere a human
//!   reads them (`FileSinkConfig`, `StdoutSinkConfig`). Text or JSON?
//! - Both are re-exported from `backends.rs` and again from `app_config.rs`.
//!
//! ⚠️ These live in `backends` (not `app_config`) so `app_config` → `backends` stays a
//!   one-way street. The module system has opinions. 🦆

use serde::Deserialize;

// ============================================================
// 📦 CommonSourceConfig: shared source-side knobs
// ============================================================

/// 📦 Controls how large a page a source emits per `next_page()` call.
///
/// A page is the unit of work on the shard channels. Bigger pages mean fewer channel hops,
/// smaller pages mean round-robin partitioning spreads work more evenly.
/// Whichever limit fires first ends the page.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CommonSourceConfig {
    /// 📦 Max lines per page
    #[serde(default = "default_max_batch_size_lines")]
    pub max_batch_size_lines: usize,
    /// 📦 Max bytes per page
    #[serde(default = "default_max_batch_size_bytes")]
    pub max_batch_size_bytes: usize,
}

// 📦 1,000 lines: roughly a feature film's worth of dialogue per page. Per shard hop.
fn default_max_batch_size_lines() -> usize {
    1000
}

fn default_max_batch_size_bytes() -> usize {
    1024 * 1024
} // -- 1MB. if one line is bigger than this, that's a monologue, not dialogue

impl Default for CommonSourceConfig {
    fn default() -> Self {
        Self {
            max_batch_size_lines: default_max_batch_size_lines(),
            max_batch_size_bytes: default_max_batch_size_bytes(),
        }
    }
}

// ============================================================
// 🚰 CommonSinkConfig: shared sink-side knobs
// ============================================================

/// 🎨 How the final report is rendered.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `key<TAB>value` per line, the classic job-output shape
    #[default]
    Text,
    /// one pretty-printed JSON object
    Json,
}

/// 🚰 Shared configuration embedded by every sink config that renders for humans.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CommonSinkConfig {
    #[serde(default)]
    pub format: OutputFormat,
}
