use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};
use tracing::{debug, trace};

use crate::backends::{CommonSinkConfig, Sink};

// -- 🚰 FileSinkConfig: cousin of FileSourceConfig, equally traumatized by disk full errors.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FileSinkConfig {
    pub file_name: String,
    #[serde(flatten)]
    pub common_config: CommonSinkConfig,
}

/// 🚰 FileSink: writes the rendered report to disk. I/O only.
///
/// Bytes go to `<file_name>.partial` first. `close()` flushes and renames it into place,
/// so the final path either holds a complete report or whatever was there before.
/// A run that fails never gets as far as `close()`, and the `.partial` is cleaned up on drop.
#[derive(Debug)]
pub(crate) struct FileSink {
    file_buf: Option<io::BufWriter<File>>,
    partial_path: PathBuf,
    sink_config: FileSinkConfig,
}

fn partial_path_for(file_name: &str) -> PathBuf {
    PathBuf::from(format!("{file_name}.partial"))
}

impl FileSink {
    /// 🚀 Creates (or truncates) the `.partial` file and wraps it in a BufWriter.
    pub(crate) async fn new(sink_config: FileSinkConfig) -> Result<Self> {
        let partial_path = partial_path_for(&sink_config.file_name);
        let file_handle = File::create(&partial_path).await.with_context(|| {
            format!(
                "💀 The sink file '{}' could not be conjured into existence. \
                 We stared at the path. The path stared back. \
                 One of us was wrong about whether the parent directory existed.",
                partial_path.display()
            )
        })?;
        Ok(Self {
            file_buf: Some(io::BufWriter::new(file_handle)),
            partial_path,
            sink_config,
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    /// 📡 One write_all call. That's the whole job. 🦆
    async fn send(&mut self, payload: String) -> Result<()> {
        trace!(
            "📬 payload of {} bytes walked into the file sink",
            payload.len()
        );
        let file_buf = self
            .file_buf
            .as_mut()
            .context("💀 The file sink was already closed. Nobody reopens a closed book.")?;
        file_buf.write_all(payload.as_bytes()).await?;
        Ok(())
    }

    /// 🗑️ Flush, fsync, rename. After this the report is at its real name.
    async fn close(&mut self) -> Result<()> {
        let Some(mut file_buf) = self.file_buf.take() else {
            return Ok(());
        };
        file_buf.flush().await.context(
            "💀 Error flushing the report. The bytes are still in memory. The disk remains unwritten.",
        )?;
        file_buf
            .into_inner()
            .sync_all()
            .await
            .context("💀 The disk nodded politely and then refused to sync")?;

        tokio::fs::rename(&self.partial_path, &self.sink_config.file_name)
            .await
            .with_context(|| {
                format!(
                    "💀 Could not move '{}' into place at '{}'",
                    self.partial_path.display(),
                    self.sink_config.file_name
                )
            })?;
        debug!("🎬 report written to '{}'", self.sink_config.file_name);
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // -- never closed means the run failed. leave no half-written report behind.
        if self.file_buf.is_some() {
            let _ = std::fs::remove_file(&self.partial_path);
        }
    }
}
