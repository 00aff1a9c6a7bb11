use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use crate::error::StoreError;
use crate::models::DonationRecord;
use crate::storage::{KeyValueBackend, MemoryBackend};

const MAX_CLAIM_ATTEMPTS: u32 = 5;

/// Ordered list of pending donations shared by the widget and the overlay.
///
/// Every mutation rewrites the whole collection. Writers going through any
/// clone of this store are serialized by one write lock, and each write bumps
/// a revision that [`QueueStore::subscribe`] observers see immediately.
/// Writers in other processes sharing the backend are only seen by polling
/// [`QueueStore::read`].
#[derive(Clone)]
pub struct QueueStore {
    backend: Arc<dyn KeyValueBackend>,
    key: String,
    write_lock: Arc<Mutex<()>>,
    revision: Arc<watch::Sender<u64>>,
}

impl QueueStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>, key: impl Into<String>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            backend,
            key: key.into(),
            write_lock: Arc::new(Mutex::new(())),
            revision: Arc::new(revision),
        }
    }

    pub fn in_memory(key: impl Into<String>) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), key)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current collection. Corrupt data reads as empty and is logged.
    pub async fn read(&self) -> Result<Vec<DonationRecord>, StoreError> {
        let Some(raw) = self.backend.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<DonationRecord>>(&raw) {
            Ok(records) => Ok(records),
            Err(source) => {
                let err = StoreError::Corrupt {
                    key: self.key.clone(),
                    source,
                };
                log::error!("{err}, treating queue as empty");
                Ok(Vec::new())
            }
        }
    }

    pub async fn append(&self, record: DonationRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read().await?;
        records.push(record);
        self.persist(&records).await
    }

    pub async fn replace(&self, records: &[DonationRecord]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.persist(records).await
    }

    /// Persist `records` only if the stored collection still equals `expected`.
    pub async fn replace_if(
        &self,
        expected: &[DonationRecord],
        records: &[DonationRecord],
    ) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let current = self.read().await?;
        if current != expected {
            return Ok(false);
        }
        self.persist(records).await?;
        Ok(true)
    }

    /// Marks the first unclaimed record as playing and returns it.
    ///
    /// Returns `None` when every record is already claimed or the queue is empty.
    pub async fn claim_next(&self, now_ms: i64) -> Result<Option<DonationRecord>, StoreError> {
        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let snapshot = self.read().await?;
            let Some(index) = snapshot.iter().position(|r| !r.is_playing) else {
                return Ok(None);
            };

            let mut updated = snapshot.clone();
            updated[index].is_playing = true;
            updated[index].claimed_at = Some(now_ms);
            let claimed = updated[index].clone();

            if self.replace_if(&snapshot, &updated).await? {
                return Ok(Some(claimed));
            }
            log::debug!("Queue changed while claiming record {}, retrying", claimed.id);
        }

        Err(StoreError::Conflict {
            attempts: MAX_CLAIM_ATTEMPTS,
        })
    }

    /// Drops the record with `id`. Returns `false` if it was already gone.
    pub async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.persist(&records).await?;
        Ok(true)
    }

    /// Removes claimed records whose claim is older than `ttl`.
    ///
    /// Claimed records without a claim time are left untouched.
    pub async fn reap_orphans(
        &self,
        now_ms: i64,
        ttl: Duration,
    ) -> Result<Vec<DonationRecord>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let (orphans, kept): (Vec<_>, Vec<_>) =
            self.read().await?.into_iter().partition(|r| {
                r.is_playing
                    && r
                        .claimed_at
                        .is_some_and(|claimed| now_ms.saturating_sub(claimed) > ttl_ms)
            });

        if !orphans.is_empty() {
            self.persist(&kept).await?;
        }
        Ok(orphans)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    async fn persist(&self, records: &[DonationRecord]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(records)?;
        self.backend.set(&self.key, raw).await?;
        self.revision.send_modify(|rev| *rev += 1);
        Ok(())
    }
}
