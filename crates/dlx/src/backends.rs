//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 Source backends pour screenplay lines in, Sink backends take the finished report away.
//! And in between, we panic! (kidding, we use anyhow)
//!
//! 🎭 This module is the casting agency. Need lines from a flat file? A gzipped flat file?
//! Straight from RAM for a test? Want the report on disk, on stdout, or in a Vec you can
//! assert against? We've got a backend for that.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use anyhow::Result;
use async_trait::async_trait;

use crate::app_config::{SinkConfig, SourceConfig};
use crate::common::Page;

pub(crate) mod common_config;
pub(crate) mod file;
pub(crate) mod in_mem;
pub(crate) mod stdout;

pub use common_config::{CommonSinkConfig, CommonSourceConfig, OutputFormat};
pub use file::{FileSinkConfig, FileSourceConfig};
pub use in_mem::InMemorySourceConfig;
pub use stdout::StdoutSinkConfig;

// ===== Source Trait and Backend Enum =====

/// 🚰 A source that produces pages of raw dialogue lines.
///
/// # Contract
/// - `next_page` returns `Some(page)` while lines remain and `None` once the well is dry.
/// - A page is newline-delimited and never empty. Sources don't parse. Shards do.
/// - `Err(...)` is fatal for the whole run. There is no partial report.
#[async_trait]
pub(crate) trait Source: std::fmt::Debug + Send {
    /// 📦 Fetch the next page of raw lines from wherever they live.
    async fn next_page(&mut self) -> Result<Option<Page>>;
}

/// 🎭 The many faces of a Source. Callers never need to know (or care)
/// whether they're reading from RAM, plain text or gzip.
#[derive(Debug)]
pub(crate) enum SourceBackend {
    InMemory(in_mem::InMemorySource),
    File(file::FileSource),
    Gzip(file::GzipFileSource),
}

impl SourceBackend {
    /// 🏭 Open whatever the config points at. Files ending in `.gz` get the gzip treatment.
    pub(crate) async fn from_config(source_config: &SourceConfig) -> Result<Self> {
        let backend = match source_config {
            SourceConfig::InMemory(config) => {
                SourceBackend::InMemory(in_mem::InMemorySource::new(config.clone()).await?)
            }
            SourceConfig::File(config) if file::is_gzip_path(&config.file_name) => {
                SourceBackend::Gzip(file::GzipFileSource::new(config.clone()).await?)
            }
            SourceConfig::File(config) => {
                SourceBackend::File(file::FileSource::new(config.clone()).await?)
            }
        };
        Ok(backend)
    }
}

#[async_trait]
impl Source for SourceBackend {
    async fn next_page(&mut self) -> Result<Option<Page>> {
        match self {
            SourceBackend::InMemory(source) => source.next_page().await,
            SourceBackend::File(source) => source.next_page().await,
            SourceBackend::Gzip(source) => source.next_page().await,
        }
    }
}

// ===== Sink Trait and Backend Enum =====

/// 🕳️ A sink that consumes fully rendered payloads.
///
/// # Contract
/// - `send` accepts a rendered payload and puts it somewhere meaningful.
/// - `close` flushes and finalizes. MUST be called. Until it is, a file sink's
///   output is not visible at its final path.
#[async_trait]
pub(crate) trait Sink: std::fmt::Debug + Send {
    /// 📥 Accept a rendered payload and write/stash it.
    async fn send(&mut self, payload: String) -> Result<()>;
    /// 🗑️ Flush, finalize, and release. Call this. Always.
    async fn close(&mut self) -> Result<()>;
}

/// 🎭 Mirrors `SourceBackend` on the other end of the pipeline.
#[derive(Debug)]
pub(crate) enum SinkBackend {
    InMemory(in_mem::InMemorySink),
    File(file::FileSink),
    Stdout(stdout::StdoutSink),
}

impl SinkBackend {
    pub(crate) async fn from_config(sink_config: &SinkConfig) -> Result<Self> {
        let backend = match sink_config {
            SinkConfig::InMemory(()) => SinkBackend::InMemory(in_mem::InMemorySink::new().await?),
            SinkConfig::File(config) => SinkBackend::File(file::FileSink::new(config.clone()).await?),
            SinkConfig::Stdout(config) => {
                SinkBackend::Stdout(stdout::StdoutSink::new(config.clone()).await?)
            }
        };
        Ok(backend)
    }
}

#[async_trait]
impl Sink for SinkBackend {
    async fn send(&mut self, payload: String) -> Result<()> {
        match self {
            SinkBackend::InMemory(sink) => sink.send(payload).await,
            SinkBackend::File(sink) => sink.send(payload).await,
            SinkBackend::Stdout(sink) => sink.send(payload).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            SinkBackend::InMemory(sink) => sink.close().await,
            SinkBackend::File(sink) => sink.close().await,
            SinkBackend::Stdout(sink) => sink.close().await,
        }
    }
}
