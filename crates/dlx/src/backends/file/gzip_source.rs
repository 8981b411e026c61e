//! 🗜️ GzipFileSource: same pages as `FileSource`, fresh out of a gzip stream.
//!
//! flate2 speaks blocking `std::io::Read`, so decompression runs on tokio's blocking pool
//! and hands finished pages back over a small bounded channel. The async side just awaits
//! the next page, like it would from any other source.
//!
//! 🧠 Knowledge graph:
//! - reader thread: `GzDecoder` → `BufReader` → `PageBuilder` → `send_blocking`
//! - channel closes when the reader returns (EOF, error, or nobody listening anymore)
//! - errors travel as `Err` items so the source worker sees them in order, after every
//!   good page that came before

use std::io::BufRead;

use anyhow::{Context, Result, anyhow};
use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use flate2::read::MultiGzDecoder;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::backends::Source;
use crate::backends::file::{FileSourceConfig, PageBuilder};
use crate::common::Page;
use crate::progress::ProgressMetrics;

// -- two pages in flight is enough to keep the decoder busy while the partitioner works
const DECODED_PAGE_BUFFER: usize = 2;

pub(crate) struct GzipFileSource {
    pages: Receiver<Result<Page>>,
    reader: Option<JoinHandle<()>>,
    source_config: FileSourceConfig,
}

impl std::fmt::Debug for GzipFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipFileSource")
            .field("source_config", &self.source_config)
            .finish()
    }
}

impl GzipFileSource {
    pub(crate) async fn new(source_config: FileSourceConfig) -> Result<Self> {
        let file_handle = tokio::fs::File::open(&source_config.file_name)
            .await
            .with_context(|| {
                format!(
                    "💀 The door to '{}' would not budge. Compressed or not, it stays shut.",
                    source_config.file_name
                )
            })?
            .into_std()
            .await;

        // -- compressed size tells us nothing about how many bytes come out, so: unknown
        let progress = ProgressMetrics::new(source_config.file_name.clone(), 0);
        let (tx, rx) = async_channel::bounded(DECODED_PAGE_BUFFER);
        let reader_config = source_config.clone();
        let reader = tokio::task::spawn_blocking(move || {
            let decoder = std::io::BufReader::new(MultiGzDecoder::new(file_handle));
            decode_pages(decoder, &reader_config, progress, tx);
        });

        Ok(Self {
            pages: rx,
            reader: Some(reader),
            source_config,
        })
    }
}

/// 🧵 Runs on the blocking pool. Returns when the stream ends, breaks, or the receiver is gone.
fn decode_pages(
    mut reader: impl BufRead,
    source_config: &FileSourceConfig,
    mut progress: ProgressMetrics,
    tx: Sender<Result<Page>>,
) {
    let mut line = Vec::new();
    loop {
        let mut builder = PageBuilder::new(&source_config.common_config);
        let mut at_eof = false;

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    at_eof = true;
                    break;
                }
                Ok(_) => {
                    if builder.push_line(&line) {
                        break;
                    }
                }
                Err(err) => {
                    let err = anyhow!(err).context(format!(
                        "💀 Decompressing '{}' went sideways. Corrupt archive, or not gzip at all.",
                        source_config.file_name
                    ));
                    let _ = tx.send_blocking(Err(err));
                    return;
                }
            }
        }

        trace!(
            "🗜️ inflated {} bytes / {} lines out of '{}'",
            builder.bytes_read(),
            builder.lines(),
            source_config.file_name
        );
        progress.update(builder.bytes_read(), builder.lines());

        if let Some(page) = builder.finish() {
            if tx.send_blocking(Ok(page)).is_err() {
                debug!("🗜️ nobody is listening for decoded pages anymore. putting the decoder down.");
                return;
            }
        }
        if at_eof {
            progress.finish();
            return;
        }
    }
}

#[async_trait]
impl Source for GzipFileSource {
    async fn next_page(&mut self) -> Result<Option<Page>> {
        match self.pages.recv().await {
            Ok(page) => page.map(Some),
            // -- closed channel: the reader thread is done. make sure it didn't die screaming.
            Err(_closed) => {
                if let Some(reader) = self.reader.take() {
                    reader
                        .await
                        .context("💀 The gzip reader thread panicked on its way out")?;
                }
                Ok(None)
            }
        }
    }
}
