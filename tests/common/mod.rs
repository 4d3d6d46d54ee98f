//! In-memory `ContactSource`/`ContactStore` doubles used by the end-to-end
//! scenario tests. Not a reference index/content-provider implementation —
//! just enough behavior to drive the engine through its state machine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use cp2_index_sync::row::Row;
use cp2_index_sync::{ContactCursor, ContactSource, ContactStore, Person, Result, SyncError};

struct VecCursor {
    rows: std::vec::IntoIter<Row>,
}

#[async_trait]
impl ContactCursor for VecCursor {
    async fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }

    async fn close(&mut self) {}
}

#[derive(Default)]
struct SourceState {
    contacts: HashMap<String, Vec<Row>>,
    updated_log: Vec<(String, i64)>,
    deleted_log: Vec<(String, i64)>,
    bulk_sync: bool,
    subs: HashMap<u64, Arc<dyn Fn() + Send + Sync>>,
}

pub struct InMemorySource {
    state: Mutex<SourceState>,
    next_sub_id: AtomicU64,
}

impl InMemorySource {
    pub fn new() -> Arc<Self> {
        Arc::new(InMemorySource {
            state: Mutex::new(SourceState::default()),
            next_sub_id: AtomicU64::new(1),
        })
    }

    pub fn upsert_contact(&self, id: &str, rows: Vec<Row>, ts_ms: i64) {
        let mut state = self.state.lock().unwrap();
        state.contacts.insert(id.to_string(), rows);
        state.updated_log.push((id.to_string(), ts_ms));
    }

    pub fn delete_contact(&self, id: &str, ts_ms: i64) {
        let mut state = self.state.lock().unwrap();
        state.contacts.remove(id);
        state.deleted_log.push((id.to_string(), ts_ms));
    }

    pub fn set_bulk_sync_in_progress(&self, in_progress: bool) {
        self.state.lock().unwrap().bulk_sync = in_progress;
    }

    /// Fire the change callback registered by the engine, as a real source
    /// would on any contact change.
    pub fn fire_change_notification(&self) {
        let callbacks: Vec<Arc<dyn Fn() + Send + Sync>> =
            self.state.lock().unwrap().subs.values().cloned().collect();
        for cb in callbacks {
            cb();
        }
    }
}

#[async_trait]
impl ContactSource for InMemorySource {
    async fn updated_ids_since(&self, since_ms: i64) -> (Vec<String>, i64) {
        let state = self.state.lock().unwrap();
        let mut ids = Vec::new();
        let mut max_ts = since_ms;
        for (id, ts) in &state.updated_log {
            if *ts > since_ms {
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
                max_ts = max_ts.max(*ts);
            }
        }
        (ids, max_ts)
    }

    async fn deleted_ids_since(&self, since_ms: i64) -> (Vec<String>, i64) {
        let state = self.state.lock().unwrap();
        let mut ids = Vec::new();
        let mut max_ts = since_ms;
        for (id, ts) in &state.deleted_log {
            if *ts > since_ms {
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
                max_ts = max_ts.max(*ts);
            }
        }
        (ids, max_ts)
    }

    async fn query_contacts(&self, ids: &[String], _columns: &[&'static str]) -> Option<Box<dyn ContactCursor>> {
        let state = self.state.lock().unwrap();
        let mut rows = Vec::new();
        for id in ids {
            if let Some(contact_rows) = state.contacts.get(id) {
                rows.extend(contact_rows.iter().cloned());
            }
        }
        Some(Box::new(VecCursor { rows: rows.into_iter() }))
    }

    async fn is_bulk_sync_in_progress(&self) -> bool {
        self.state.lock().unwrap().bulk_sync
    }

    fn subscribe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> cp2_index_sync::source::SubscriptionId {
        let id = self.next_sub_id.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap().subs.insert(id, on_change);
        id
    }

    fn unsubscribe(&self, id: cp2_index_sync::source::SubscriptionId) {
        self.state.lock().unwrap().subs.remove(&id);
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, Person>>,
    fail_next_upsert: AtomicBool,
    fail_next_delete: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(InMemoryStore::default())
    }

    pub fn fail_next_upsert(&self) {
        self.fail_next_upsert.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_delete(&self) {
        self.fail_next_delete.store(true, Ordering::SeqCst);
    }

    pub fn ids(&self) -> std::collections::HashSet<String> {
        self.records.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ContactStore for InMemoryStore {
    async fn register_schema(&self, _force: bool) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, records: Vec<Person>) -> Result<()> {
        if self.fail_next_upsert.swap(false, Ordering::SeqCst) {
            return Err(SyncError::StoreInternalError("induced test failure".into()));
        }
        let mut map = self.records.lock().unwrap();
        for record in records {
            map.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn delete_by_id(&self, ids: Vec<String>) -> Result<()> {
        if self.fail_next_delete.swap(false, Ordering::SeqCst) {
            return Err(SyncError::StoreInternalError("induced test failure".into()));
        }
        let mut map = self.records.lock().unwrap();
        for id in ids {
            map.remove(&id);
        }
        Ok(())
    }

    async fn list_all_ids(&self, _namespace: &str) -> Result<Vec<String>> {
        Ok(self.records.lock().unwrap().keys().cloned().collect())
    }
}

pub fn contact_row(id: &str, display_name: &str) -> Row {
    use cp2_index_sync::row::ColumnValue;
    use cp2_index_sync::source::{columns, mime_types};

    Row::new()
        .set(columns::CONTACT_ID, ColumnValue::Int(id.parse().unwrap()))
        .set(columns::MIME_TYPE, ColumnValue::Text(mime_types::EMAIL.to_string()))
        .set(columns::DISPLAY_NAME_PRIMARY, ColumnValue::Text(display_name.to_string()))
        .set(columns::ADDRESS, ColumnValue::Text(format!("{display_name}@example.test")))
}
