//! Update scheduler / state machine: the single-writer executor that
//! debounces delta triggers and drives full/delta update runs.
//!
//! All engine-owned state (`Settings`, the batcher, store/source handles) is
//! touched only from the worker task spawned in [`SyncEngine::spawn`]. The
//! only state touched from other threads is the `delta_pending` atomic bool
//! and the command channel, matching the single-consumer task queue
//! discipline called for by the concurrency model.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Result, SyncError};
use crate::pipeline::update_person_corpus;
use crate::settings::{Settings, SettingsStore};
use crate::source::ContactSource;
use crate::stats::{UpdateStats, UpdateType};
use crate::store::ContactStore;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

pub(crate) fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

enum Command {
    FullUpdate {
        cancel: CancellationToken,
        done: oneshot::Sender<Result<()>>,
    },
    DeltaUpdate,
    Shutdown {
        done: oneshot::Sender<()>,
    },
    /// Barrier: answered only after every command enqueued before it has
    /// been processed, since the channel is FIFO and the worker is single-
    /// consumer. Lets a caller wait for a just-notified delta run to finish
    /// without weakening the debounce contract.
    Ping {
        done: oneshot::Sender<()>,
    },
}

/// Handle to a running engine. Cheap to clone/share; the actual state lives
/// in the worker task.
pub struct SyncEngine {
    command_tx: flume::Sender<Command>,
    delta_pending: Arc<AtomicBool>,
    shutting_down: Arc<AtomicBool>,
    worker: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn spawn(
        source: Arc<dyn ContactSource>,
        store: Arc<dyn ContactStore>,
        config: Arc<EngineConfig>,
        namespace: String,
        settings_path: std::path::PathBuf,
    ) -> Arc<Self> {
        let (tx, rx) = flume::unbounded();
        let delta_pending = Arc::new(AtomicBool::new(false));
        let shutting_down = Arc::new(AtomicBool::new(false));

        let worker_delta_pending = delta_pending.clone();
        let settings_store = SettingsStore::new(settings_path);
        let settings = settings_store.load();

        let handle = tokio::spawn(async move {
            let mut worker = Worker {
                source,
                store,
                config,
                namespace,
                settings_store,
                settings,
                delta_pending: worker_delta_pending,
            };
            worker.run(rx).await;
        });

        Arc::new(SyncEngine {
            command_tx: tx,
            delta_pending,
            shutting_down,
            worker: tokio::sync::Mutex::new(Some(handle)),
        })
    }

    /// Run a full update now. Resolves once the run completes (success or
    /// failure); does not advance timestamps on failure.
    pub async fn trigger_full_update(&self, cancel: CancellationToken) -> Result<()> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(SyncError::SourceUnavailable("engine is shutting down".into()));
        }
        let (done_tx, done_rx) = oneshot::channel();
        self.command_tx
            .send_async(Command::FullUpdate { cancel, done: done_tx })
            .await
            .map_err(|_| SyncError::SourceUnavailable("engine worker is gone".into()))?;
        done_rx
            .await
            .map_err(|_| SyncError::SourceUnavailable("engine worker dropped the response".into()))?
    }

    /// The debounced delta entry point. Only the `false -> true` transition
    /// of `delta_pending` enqueues a task; any notifications arriving while
    /// a delta run is in flight (or already queued) are coalesced for free.
    pub fn notify_source_changed(&self) {
        if self.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        if self
            .delta_pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let _ = self.command_tx.send(Command::DeltaUpdate);
        }
    }

    /// Wait until every command enqueued before this call has been
    /// processed by the worker (see [`Command::Ping`]).
    pub async fn wait_idle(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.command_tx.send_async(Command::Ping { done: done_tx }).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Unregister the change subscription (caller's responsibility via
    /// [`ContactSource::unsubscribe`] before calling this), then drain the
    /// worker with a bounded grace period. Submits after this call are
    /// dropped.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);

        let (done_tx, done_rx) = oneshot::channel();
        if self.command_tx.send_async(Command::Shutdown { done: done_tx }).await.is_ok() {
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, done_rx).await;
        }

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!("engine worker did not drain within the shutdown grace period");
            }
        }
    }
}

struct Worker {
    source: Arc<dyn ContactSource>,
    store: Arc<dyn ContactStore>,
    config: Arc<EngineConfig>,
    namespace: String,
    settings_store: SettingsStore,
    settings: Settings,
    delta_pending: Arc<AtomicBool>,
}

impl Worker {
    async fn run(&mut self, rx: flume::Receiver<Command>) {
        while let Ok(cmd) = rx.recv_async().await {
            match cmd {
                Command::FullUpdate { cancel, done } => {
                    let result = self.run_full_update(cancel).await;
                    let _ = done.send(result);
                }
                Command::DeltaUpdate => {
                    self.run_delta_update().await;
                }
                Command::Shutdown { done } => {
                    let _ = done.send(());
                    break;
                }
                Command::Ping { done } => {
                    let _ = done.send(());
                }
            }
        }
    }

    async fn run_full_update(&mut self, cancel: CancellationToken) -> Result<()> {
        if !self.config.indexer_enabled {
            return Err(SyncError::Disabled);
        }

        let now = wall_clock_ms();
        let (mut wanted, _) = self.source.updated_ids_since(0).await;
        if wanted.len() > self.config.full_update_limit {
            wanted.truncate(self.config.full_update_limit);
        }
        let wanted_set: HashSet<&str> = wanted.iter().map(String::as_str).collect();

        let known = self.store.list_all_ids(&self.namespace).await?;
        let known_set: HashSet<String> = known.iter().cloned().collect();
        let unwanted: Vec<String> = known.into_iter().filter(|id| !wanted_set.contains(id.as_str())).collect();

        let mut stats = UpdateStats::new(UpdateType::Full, now);
        let result = update_person_corpus(
            self.source.as_ref(),
            &self.store,
            &self.config,
            wanted,
            unwanted,
            Some(&known_set),
            &mut stats,
            &cancel,
        )
        .await;

        info!(run = "full", "{}", stats);

        if result.is_ok() && !cancel.is_cancelled() {
            self.settings.last_full_update = now;
            self.settings.last_delta_update = now;
            self.settings.last_delta_delete = now;
            self.settings_store.persist(self.settings);
        }

        result
    }

    async fn run_delta_update(&mut self) {
        // Clear before reading "since" timestamps: a notification arriving
        // during this run re-sets the flag and queues a fresh one, and the
        // timestamps we read here are exactly the ones that run will need
        // to improve on.
        self.delta_pending.store(false, Ordering::SeqCst);

        if !self.config.indexer_enabled {
            debug!("delta skipped: indexer disabled");
            return;
        }
        if self.settings.last_full_update == 0 {
            debug!("delta deferred: no prior full update");
            return;
        }
        if self.source.is_bulk_sync_in_progress().await {
            debug!("delta deferred: ambient source sync in progress");
            return;
        }

        let last_delta_update = self.settings.last_delta_update;
        let last_delta_delete = self.settings.last_delta_delete;
        let is_first_delta_after_full = last_delta_update == self.settings.last_full_update;

        let (mut wanted, newest_updated_ts) = self.source.updated_ids_since(last_delta_update).await;
        let (unwanted, newest_deleted_ts) = self.source.deleted_ids_since(last_delta_delete).await;

        let cap = if is_first_delta_after_full {
            self.config.instant_indexing_limit
        } else {
            self.config.delta_update_limit
        };
        if wanted.len() > cap {
            wanted.truncate(cap);
        }

        let mut stats = UpdateStats::new(UpdateType::Delta, wall_clock_ms());
        let cancel = CancellationToken::new();
        let result = update_person_corpus(
            self.source.as_ref(),
            &self.store,
            &self.config,
            wanted,
            unwanted,
            None,
            &mut stats,
            &cancel,
        )
        .await;

        info!(run = "delta", "{}", stats);

        if result.is_ok() {
            self.settings.last_delta_update = newest_updated_ts;
            // A delete-chunk failure never fails the run's future (§4.4), but
            // it must not advance the delete watermark past unacknowledged
            // work — see the delete-chunk-failure resolution in DESIGN.md.
            if stats.delete_succeeded() {
                self.settings.last_delta_delete = newest_deleted_ts;
            }
            self.settings_store.persist(self.settings);
        }
    }
}
