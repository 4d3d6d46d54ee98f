//! Thin adapters wiring external lifecycle and change-notification edges
//! into the engine. No sync logic lives here.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::EngineConfig;
use crate::engine::{wall_clock_ms, SyncEngine};
use crate::error::Result;
use crate::source::{ContactSource, SubscriptionId};
use crate::store::ContactStore;

/// Held by the caller for the lifetime of a user context; `lifecycle_stop`
/// consumes it.
pub struct LifecycleHandle {
    pub engine: Arc<SyncEngine>,
    subscription: SubscriptionId,
}

/// Lifecycle start: construct the engine, register the change subscription,
/// and schedule a full update if the watermark is stale or absent (§4.7).
pub async fn lifecycle_start(
    source: Arc<dyn ContactSource>,
    store: Arc<dyn ContactStore>,
    config: Arc<EngineConfig>,
    namespace: String,
    settings_path: PathBuf,
) -> LifecycleHandle {
    if let Err(e) = store.register_schema(false).await {
        warn!(error = %e, "schema registration failed at lifecycle start");
    }

    let settings_store = crate::settings::SettingsStore::new(settings_path.clone());
    let settings = settings_store.load();
    let now = wall_clock_ms();
    let full_update_due =
        settings.last_full_update == 0 || now - settings.last_full_update >= config.full_update_interval_ms;

    let engine = SyncEngine::spawn(source.clone(), store, config, namespace, settings_path);

    let callback_engine = engine.clone();
    let subscription = source.subscribe(Arc::new(move || callback_engine.notify_source_changed()));

    if full_update_due {
        let job_engine = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = job_engine.trigger_full_update(CancellationToken::new()).await {
                warn!(error = %e, "scheduled full update failed");
            }
        });
    }

    LifecycleHandle { engine, subscription }
}

/// Lifecycle stop: unregister the change subscription and shut the engine
/// down with its bounded grace period.
pub async fn lifecycle_stop(source: &Arc<dyn ContactSource>, handle: LifecycleHandle) {
    source.unsubscribe(handle.subscription);
    handle.engine.shutdown().await;
}

/// Change notification from the source: invoke the debounced delta entry
/// point. Never blocks; the atomic flag and channel send are non-blocking.
pub fn on_change_notification(engine: &SyncEngine) {
    engine.notify_source_changed();
}

/// Maintenance job runs the full-update entry point with a cancellation
/// token supplied by the scheduler.
pub async fn on_maintenance_job(engine: &SyncEngine, cancel: CancellationToken) -> Result<()> {
    engine.trigger_full_update(cancel).await
}
