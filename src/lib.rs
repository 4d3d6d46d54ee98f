//! Synchronizes a device's canonical contact database (CP2) into a
//! full-text search index.
//!
//! ## Module organization
//!
//! - `model`: the canonical `Person`/`ContactPoint` record and the pure
//!   accumulator types used to build one from a contiguous run of source
//!   rows.
//! - `row`: the loosely-typed row shape a `ContactCursor` yields.
//! - `source`: the `ContactSource` collaborator interface.
//! - `store`: the `ContactStore` collaborator interface.
//! - `decode`: contact row decoder, folding a cursor into `Person` records.
//! - `batcher`: batched bulk upsert accumulation.
//! - `pipeline`: indexer pipeline tying the decoder and batcher together
//!   over wanted/unwanted id sets.
//! - `stats`: per-run counters and result-code sets.
//! - `settings`: durable watermark file.
//! - `config`: the engine's enumerated configuration.
//! - `engine`: the update scheduler / state machine.
//! - `triggers`: thin lifecycle/change-notification adapters.
//! - `registry`: keyed per-user engine registry, ambient lifecycle support.
//! - `error`: the crate's error taxonomy.

pub mod batcher;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod row;
pub mod settings;
pub mod source;
pub mod stats;
pub mod store;
pub mod triggers;

pub use config::EngineConfig;
pub use engine::SyncEngine;
pub use error::{ErrorCode, Result, SyncError};
pub use model::{ContactPoint, NameEntry, NameKind, Person};
pub use settings::{Settings, SettingsStore};
pub use source::{ContactCursor, ContactSource};
pub use stats::{UpdateStats, UpdateType};
pub use store::ContactStore;

/// Installs a `tracing-subscriber` format layer reading `RUST_LOG`
/// (falling back to `info`) — the same convention the ambient stack in this
/// lineage uses for its binaries. Library consumers are free to set up their
/// own subscriber instead; this is a convenience, not a requirement.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
