//! Keyed registry mapping a user/account id to a running engine's lifecycle
//! handle — the "singletons for per-user instances" re-architecture named in
//! the design notes: no statics in the engine itself, only this
//! caller-owned, keyed map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::triggers::LifecycleHandle;

#[derive(Default)]
pub struct EngineRegistry {
    handles: RwLock<HashMap<String, LifecycleHandle>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        EngineRegistry { handles: RwLock::new(HashMap::new()) }
    }

    pub async fn insert(&self, user_id: String, handle: LifecycleHandle) {
        self.handles.write().await.insert(user_id, handle);
    }

    pub async fn engine(&self, user_id: &str) -> Option<Arc<crate::engine::SyncEngine>> {
        self.handles.read().await.get(user_id).map(|h| h.engine.clone())
    }

    pub async fn remove(&self, user_id: &str) -> Option<LifecycleHandle> {
        self.handles.write().await.remove(user_id)
    }

    pub async fn user_ids(&self) -> Vec<String> {
        self.handles.read().await.keys().cloned().collect()
    }
}
