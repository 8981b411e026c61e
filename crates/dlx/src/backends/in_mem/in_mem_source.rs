use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::backends::{CommonSourceConfig, Source};
use crate::common::Page;
use crate::progress::ProgressMetrics;

/// 🧠 Lines held in memory, paged like any other source.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct InMemorySourceConfig {
    pub lines: Vec<String>,
    #[serde(default)]
    pub common_config: CommonSourceConfig,
}

impl InMemorySourceConfig {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            common_config: CommonSourceConfig::default(),
        }
    }
}

/// 📦 The world's most cooperative data source: every line is already here.
///
/// Pages hold at most `max_batch_size_lines` lines and are joined with `\n`. Unlike the
/// file source it keeps blank lines, because a caller who handed us a blank line probably
/// wants to see it skipped by the parser. Not by us.
#[derive(Debug)]
pub(crate) struct InMemorySource {
    lines: std::vec::IntoIter<String>,
    page_lines: usize,
    // -- hidden bar: nothing to draw for RAM, but the counts still feed the logs
    progress: ProgressMetrics,
}

impl InMemorySource {
    /// 🚀 No I/O. No prayers. It's async because we respect the trait contract.
    pub(crate) async fn new(source_config: InMemorySourceConfig) -> Result<Self> {
        Ok(Self {
            page_lines: source_config.common_config.max_batch_size_lines.max(1),
            lines: source_config.lines.into_iter(),
            progress: ProgressMetrics::hidden("in-memory".to_string()),
        })
    }
}

#[async_trait]
impl Source for InMemorySource {
    async fn next_page(&mut self) -> Result<Option<Page>> {
        let chunk: Vec<String> = self.lines.by_ref().take(self.page_lines).collect();
        if chunk.is_empty() {
            debug!(
                "🧠 in-memory source ran dry after {} lines ({} bytes)",
                self.progress.total_lines(),
                self.progress.total_bytes()
            );
            self.progress.finish();
            return Ok(None);
        }
        let page = chunk.join("\n");
        self.progress.update(page.len() as u64, chunk.len() as u64);
        Ok(Some(page))
    }
}
