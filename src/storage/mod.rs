//! Key-value persistence behind the shared donation queue.
//!
//! The queue store only ever reads and writes one whole JSON document per key,
//! so a backend needs nothing more than `get` and `set`.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{QueueBackendKind, QueueConfig};
use crate::error::StoreError;

#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Raw document stored under `key`, `None` when nothing was written yet.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the document under `key` in one step.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

pub async fn create_backend(config: &QueueConfig) -> Result<Arc<dyn KeyValueBackend>, StoreError> {
    match config.backend {
        QueueBackendKind::Memory => {
            log::warn!("Using in-memory queue backend, donations are lost on restart");
            Ok(Arc::new(MemoryBackend::new()))
        }
        QueueBackendKind::File => {
            let backend = FileBackend::open(&config.data_dir).await?;
            log::info!("Using file queue backend at {}", config.data_dir);
            Ok(Arc::new(backend))
        }
    }
}
