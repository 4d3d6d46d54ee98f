//! Accumulates decoded `Person` records and flushes fixed-size batches to
//! the store.
//!
//! The "composed future with serial chaining" from the source material maps
//! directly onto ordinary `async`/`await`: because the batcher is only ever
//! driven from the engine's single worker task, awaiting each flush inline
//! already bounds in-flight upserts to one and preserves submission order.
//! No explicit chain data structure is needed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::decode::PersonSink;
use crate::error::Result;
use crate::model::Person;
use crate::store::ContactStore;

pub struct Batcher {
    store: Arc<dyn ContactStore>,
    batch_size: usize,
    queue: Vec<Person>,
}

impl Batcher {
    pub fn new(store: Arc<dyn ContactStore>, batch_size: usize) -> Self {
        assert!(batch_size >= 1, "batch size must be at least 1");
        Batcher {
            store,
            batch_size,
            queue: Vec::new(),
        }
    }

    pub async fn add(&mut self, person: Person) -> Result<()> {
        self.queue.push(person);
        if self.queue.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Detach the current queue and upsert it. A no-op when the queue is
    /// empty, so callers can unconditionally flush at the end of a run.
    pub async fn flush(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.queue);
        self.store.upsert(batch).await
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }
}

#[async_trait]
impl PersonSink for Batcher {
    async fn push(&mut self, person: Person) -> Result<()> {
        self.add(person).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use std::sync::Mutex;

    struct RecordingStore {
        batches: Mutex<Vec<Vec<Person>>>,
        fail_next: Mutex<bool>,
    }

    impl RecordingStore {
        fn new() -> Self {
            RecordingStore {
                batches: Mutex::new(Vec::new()),
                fail_next: Mutex::new(false),
            }
        }

        fn fail_next_upsert(&self) {
            *self.fail_next.lock().unwrap() = true;
        }
    }

    #[async_trait]
    impl ContactStore for RecordingStore {
        async fn register_schema(&self, _force: bool) -> Result<()> {
            Ok(())
        }

        async fn upsert(&self, records: Vec<Person>) -> Result<()> {
            if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
                return Err(SyncError::StoreInternalError("boom".into()));
            }
            self.batches.lock().unwrap().push(records);
            Ok(())
        }

        async fn delete_by_id(&self, _ids: Vec<String>) -> Result<()> {
            Ok(())
        }

        async fn list_all_ids(&self, _namespace: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn person(id: &str) -> Person {
        Person {
            id: id.to_string(),
            display_name: id.to_string(),
            given_name: None,
            middle_name: None,
            family_name: None,
            additional_names: Vec::new(),
            external_uri: None,
            image_uri: None,
            is_important: false,
            is_bot: false,
            affiliations: Vec::new(),
            relations: Vec::new(),
            note: None,
            contact_points: Vec::new(),
        }
    }

    #[tokio::test]
    async fn flushes_automatically_at_batch_size() {
        let store = Arc::new(RecordingStore::new());
        let mut batcher = Batcher::new(store.clone(), 2);
        batcher.add(person("1")).await.unwrap();
        assert_eq!(batcher.pending_len(), 1);
        batcher.add(person("2")).await.unwrap();
        assert_eq!(batcher.pending_len(), 0);
        assert_eq!(store.batches.lock().unwrap().len(), 1);
        assert_eq!(store.batches.lock().unwrap()[0].len(), 2);
    }

    #[tokio::test]
    async fn batch_size_one_flushes_every_add() {
        let store = Arc::new(RecordingStore::new());
        let mut batcher = Batcher::new(store.clone(), 1);
        batcher.add(person("1")).await.unwrap();
        batcher.add(person("2")).await.unwrap();
        assert_eq!(store.batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn flush_drains_remainder_below_threshold() {
        let store = Arc::new(RecordingStore::new());
        let mut batcher = Batcher::new(store.clone(), 50);
        batcher.add(person("1")).await.unwrap();
        batcher.add(person("2")).await.unwrap();
        assert_eq!(store.batches.lock().unwrap().len(), 0);
        batcher.flush().await.unwrap();
        assert_eq!(store.batches.lock().unwrap().len(), 1);
        assert_eq!(store.batches.lock().unwrap()[0].len(), 2);
    }

    #[tokio::test]
    async fn flush_on_empty_queue_is_a_noop() {
        let store = Arc::new(RecordingStore::new());
        let mut batcher = Batcher::new(store.clone(), 50);
        batcher.flush().await.unwrap();
        assert_eq!(store.batches.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn store_failure_propagates_and_drops_the_failed_batch() {
        let store = Arc::new(RecordingStore::new());
        store.fail_next_upsert();
        let mut batcher = Batcher::new(store.clone(), 1);
        let err = batcher.add(person("1")).await.unwrap_err();
        assert!(matches!(err, SyncError::StoreInternalError(_)));
        assert_eq!(batcher.pending_len(), 0);
    }
}
