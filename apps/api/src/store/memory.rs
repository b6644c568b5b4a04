use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{DocumentBackend, SharedDocument, StoreError};

/// Process-local stand-in for the remote document, used when no gist is configured.
/// Data is lost on restart.
#[derive(Default)]
pub struct MemoryBackend {
    document: Mutex<SharedDocument>,
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<SharedDocument, StoreError> {
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, document: &SharedDocument) -> Result<(), StoreError> {
        *self.document.lock().await = document.clone();
        Ok(())
    }
}
