//! 📺 StdoutSink: the report goes straight to the terminal (or whatever pipe is listening).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{self, AsyncWriteExt};

use crate::backends::{CommonSinkConfig, Sink};

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct StdoutSinkConfig {
    #[serde(flatten)]
    pub common_config: CommonSinkConfig,
}

pub(crate) struct StdoutSink {
    stdout: io::Stdout,
    sink_config: StdoutSinkConfig,
}

impl std::fmt::Debug for StdoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutSink")
            .field("sink_config", &self.sink_config)
            .finish()
    }
}

impl StdoutSink {
    pub(crate) async fn new(sink_config: StdoutSinkConfig) -> Result<Self> {
        Ok(Self {
            stdout: io::stdout(),
            sink_config,
        })
    }
}

#[async_trait]
impl Sink for StdoutSink {
    async fn send(&mut self, payload: String) -> Result<()> {
        self.stdout
            .write_all(payload.as_bytes())
            .await
            .context("💀 stdout hung up on us. Somebody closed the pipe mid-sentence.")
    }

    async fn close(&mut self) -> Result<()> {
        self.stdout
            .flush()
            .await
            .context("💀 stdout would not flush")
    }
}
