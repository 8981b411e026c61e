use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt},
};
use tracing::trace;

use crate::backends::file::PageBuilder;
use crate::backends::{CommonSourceConfig, Source};
use crate::common::Page;
use crate::progress::ProgressMetrics;

// -- 📂 FileSourceConfig: "It's just a text file", said no screenwriter ever.
// -- Co-located with the FileSource that uses it. One backend = one config = one file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FileSourceConfig {
    pub file_name: String,
    #[serde(default)]
    pub common_config: CommonSourceConfig,
}

/// 📂 FileSource: reads a text file line by line and pours pages into the pipeline.
///
/// A page ends at EOF, at `max_batch_size_lines`, or at `max_batch_size_bytes`,
/// whichever comes first. Async all the way down: the BufReader wraps a tokio `File`.
///
/// ⚠️ Lines are read as bytes. Invalid UTF-8 is replaced, never fatal: only a failed
/// read fails the run.
pub(crate) struct FileSource {
    buf_reader: io::BufReader<File>,
    source_config: FileSourceConfig,
    progress: ProgressMetrics,
}

// 🐛 progress is left out. nobody debugging a FileSource wants a wall of spinner state.
impl std::fmt::Debug for FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSource")
            .field("source_config", &self.source_config)
            .finish()
    }
}

impl FileSource {
    /// 🚀 Opens the file and grabs its size for the progress bar.
    /// If metadata fails we assume 0 bytes and the bar shows unknown.
    pub(crate) async fn new(source_config: FileSourceConfig) -> Result<Self> {
        let file_handle = File::open(&source_config.file_name)
            .await
            .with_context(|| {
                format!(
                    "💀 The door to '{}' would not budge. We knocked. We checked if it existed \
                     (it might not). We checked permissions (they might be wrong). \
                     The screenplay remains unread.",
                    source_config.file_name
                )
            })?;

        let file_size = file_handle.metadata().await.map(|m| m.len()).unwrap_or(0);
        let progress = ProgressMetrics::new(source_config.file_name.clone(), file_size);

        Ok(Self {
            buf_reader: io::BufReader::new(file_handle),
            source_config,
            progress,
        })
    }
}

#[async_trait]
impl Source for FileSource {
    /// 📄 Read the next page. `None` once EOF hands us nothing but blank lines.
    async fn next_page(&mut self) -> Result<Option<Page>> {
        loop {
            let mut builder = PageBuilder::new(&self.source_config.common_config);
            let mut line = Vec::new();
            let mut at_eof = false;

            loop {
                line.clear();
                let bytes_read = self
                    .buf_reader
                    .read_until(b'\n', &mut line)
                    .await
                    .with_context(|| {
                        format!(
                            "💀 Reading '{}' went sideways mid-scene",
                            self.source_config.file_name
                        )
                    })?;
                if bytes_read == 0 {
                    at_eof = true;
                    break;
                }
                if builder.push_line(&line) {
                    break;
                }
            }

            trace!(
                "📖 hauled {} bytes / {} lines out of '{}'",
                builder.bytes_read(),
                builder.lines(),
                self.source_config.file_name
            );
            self.progress.update(builder.bytes_read(), builder.lines());

            match builder.finish() {
                Some(page) => return Ok(Some(page)),
                None if at_eof => {
                    self.progress.finish();
                    return Ok(None);
                }
                // -- a page of nothing but blank lines, and more file to go. keep reading.
                None => continue,
            }
        }
    }
}
