//! The `ContactSource` collaborator interface: the external contact provider
//! (CP2). The engine only ever talks to this trait; nothing here implements
//! an actual content-provider query.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::row::Row;

/// Column name constants for the per-mime-type cursor rows (§6).
pub mod columns {
    pub const ID: &str = "_id";
    pub const CONTACT_ID: &str = "contact_id";
    pub const MIME_TYPE: &str = "mime_type";
    pub const LOOKUP_KEY: &str = "lookup_key";
    pub const PHOTO_THUMBNAIL_URI: &str = "photo_thumbnail_uri";
    pub const DISPLAY_NAME_PRIMARY: &str = "display_name_primary";
    pub const PHONETIC_NAME: &str = "phonetic_name";
    pub const RAW_CONTACT_ID: &str = "raw_contact_id";
    pub const NAME_RAW_CONTACT_ID: &str = "name_raw_contact_id";
    pub const STARRED: &str = "starred";
    pub const IS_PRIMARY: &str = "is_primary";
    pub const IS_SUPER_PRIMARY: &str = "is_super_primary";

    pub const ADDRESS: &str = "address";
    pub const TYPE: &str = "type";
    pub const LABEL: &str = "label";
    pub const NAME: &str = "name";
    pub const TITLE: &str = "title";
    pub const DEPARTMENT: &str = "department";
    pub const COMPANY: &str = "company";
    pub const NOTE: &str = "note";
    pub const GIVEN: &str = "given";
    pub const MIDDLE: &str = "middle";
    pub const FAMILY: &str = "family";
}

/// The fixed set of mime types the decoder knows how to dispatch. Anything
/// else is skipped silently.
pub mod mime_types {
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const POSTAL: &str = "postal";
    pub const NICKNAME: &str = "nickname";
    pub const STRUCTURED_NAME: &str = "structured_name";
    pub const ORGANIZATION: &str = "organization";
    pub const RELATION: &str = "relation";
    pub const NOTE: &str = "note";
}

/// A row-oriented iterator produced by the source, sorted by
/// `(contact_id ASC, is_super_primary DESC, is_primary DESC, raw_contact_id ASC)`.
#[async_trait]
pub trait ContactCursor: Send {
    /// Advance and return the next row, or `None` on exhaustion.
    async fn next_row(&mut self) -> Result<Option<Row>>;

    /// Release any underlying resources. Called on every exit path
    /// (exhaustion, decode error, cancellation).
    async fn close(&mut self);
}

pub type SubscriptionId = u64;

/// The external contact provider.
#[async_trait]
pub trait ContactSource: Send + Sync {
    /// Ids updated since `since_ms`, and the max timestamp observed among
    /// the returned rows (unchanged if the result set is empty). A transient
    /// failure returns `(vec![], since_ms)` rather than an error.
    async fn updated_ids_since(&self, since_ms: i64) -> (Vec<String>, i64);

    /// As [`ContactSource::updated_ids_since`], for deletions.
    async fn deleted_ids_since(&self, since_ms: i64) -> (Vec<String>, i64);

    /// Open a cursor over `ids`, requesting `columns` plus whatever columns
    /// the implementation always includes (`mime_type` at minimum). Returns
    /// `None` as a non-fatal failure signal (maps to `SourceUnavailable`).
    async fn query_contacts(
        &self,
        ids: &[String],
        columns: &[&'static str],
    ) -> Option<Box<dyn ContactCursor>>;

    /// True while the source is in the middle of its own bulk/ambient sync;
    /// delta triggers arriving during this window are deferred (§4.5).
    async fn is_bulk_sync_in_progress(&self) -> bool;

    /// Register a callback invoked on any contact change. Returns an id
    /// usable with [`ContactSource::unsubscribe`].
    fn subscribe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}
