use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::Sink;

/// 📦 A sink that never forgets.
///
/// Each entry is one fully rendered payload. Clone-able because callers need to peek
/// inside after handing the sink to the pipeline: the `Arc` means every clone shares
/// the same Vec. Communist data, but in a good way.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemorySink {
    pub(crate) received: Arc<Mutex<Vec<String>>>,
}

impl InMemorySink {
    pub(crate) async fn new() -> Result<Self> {
        Ok(Self::default())
    }

    /// 📋 Snapshot of everything sent so far.
    pub(crate) async fn payloads(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl Sink for InMemorySink {
    async fn send(&mut self, payload: String) -> Result<()> {
        // 🔒 The Mutex is load-bearing. Do not remove. I know it looks optional. It isn't.
        self.received.lock().await.push(payload);
        Ok(())
    }

    /// 🗑️ We live in RAM. Nothing to flush. Why did the in-memory sink go to therapy?
    /// It had trouble letting go.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
