//! Indexer pipeline: deletes unwanted ids in batches, then queries the
//! source for wanted ids in batches and feeds rows through the decoder
//! into the batcher.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::batcher::Batcher;
use crate::config::EngineConfig;
use crate::decode::{decode_cursor, PersonSink};
use crate::error::{ErrorCode, Result, SyncError};
use crate::model::Person;
use crate::source::{columns, ContactSource};
use crate::stats::UpdateStats;
use crate::store::ContactStore;

/// All columns any of the eight fixed mime-type handlers might read. The
/// decoder is a single pass over whatever the source hands back, so the
/// pipeline always requests the full set rather than negotiating per call.
const REQUESTED_COLUMNS: &[&str] = &[
    columns::ID,
    columns::CONTACT_ID,
    columns::MIME_TYPE,
    columns::LOOKUP_KEY,
    columns::PHOTO_THUMBNAIL_URI,
    columns::DISPLAY_NAME_PRIMARY,
    columns::PHONETIC_NAME,
    columns::RAW_CONTACT_ID,
    columns::NAME_RAW_CONTACT_ID,
    columns::STARRED,
    columns::IS_PRIMARY,
    columns::IS_SUPER_PRIMARY,
    columns::ADDRESS,
    columns::TYPE,
    columns::LABEL,
    columns::NAME,
    columns::TITLE,
    columns::DEPARTMENT,
    columns::COMPANY,
    columns::NOTE,
    columns::GIVEN,
    columns::MIDDLE,
    columns::FAMILY,
];

/// Classifies each `Person` record passing through a wrapped sink as an
/// insert or an update against a known-ids snapshot taken before the run,
/// so the pipeline can attribute per-chunk counters without the decoder
/// knowing anything about stats. Without a snapshot (delta runs, which have
/// no cheap way to know prior store membership) every record counts as an
/// update.
struct ClassifyingSink<'a> {
    inner: &'a mut dyn PersonSink,
    known_ids: Option<&'a HashSet<String>>,
    inserted: usize,
    updated: usize,
}

#[async_trait]
impl<'a> PersonSink for ClassifyingSink<'a> {
    async fn push(&mut self, person: Person) -> Result<()> {
        match self.known_ids {
            Some(known) if !known.contains(&person.id) => self.inserted += 1,
            _ => self.updated += 1,
        }
        self.inner.push(person).await
    }
}

/// `update_person_corpus(wanted_ids, unwanted_ids, stats)`: the sole public
/// entry point of this pipeline.
pub async fn update_person_corpus(
    source: &dyn ContactSource,
    store: &Arc<dyn ContactStore>,
    config: &EngineConfig,
    wanted_ids: Vec<String>,
    unwanted_ids: Vec<String>,
    known_ids: Option<&HashSet<String>>,
    stats: &mut UpdateStats,
    cancel: &CancellationToken,
) -> Result<()> {
    run_deletes(store, config, unwanted_ids, stats, cancel).await;

    if cancel.is_cancelled() {
        debug!("pipeline cancelled before update phase");
        return Ok(());
    }

    run_updates(source, store, config, wanted_ids, known_ids, stats, cancel).await
}

async fn run_deletes(
    store: &Arc<dyn ContactStore>,
    config: &EngineConfig,
    unwanted_ids: Vec<String>,
    stats: &mut UpdateStats,
    cancel: &CancellationToken,
) {
    for chunk in unwanted_ids.chunks(config.delete_batch.max(1)) {
        if cancel.is_cancelled() {
            debug!("pipeline cancelled during delete phase");
            return;
        }

        match store.delete_by_id(chunk.to_vec()).await {
            Ok(()) => {
                stats.contacts_deleted += chunk.len() as u64;
                stats.record_delete_result(ErrorCode::Success);
            }
            Err(e) => {
                warn!(error = %e, chunk_len = chunk.len(), "delete chunk failed, continuing");
                stats.contacts_delete_failed += chunk.len() as u64;
                stats.record_delete_result(e.code());
            }
        }
    }
    stats.record_delete_result(ErrorCode::Success);
}

async fn run_updates(
    source: &dyn ContactSource,
    store: &Arc<dyn ContactStore>,
    config: &EngineConfig,
    wanted_ids: Vec<String>,
    known_ids: Option<&HashSet<String>>,
    stats: &mut UpdateStats,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut batcher = Batcher::new(store.clone(), config.upsert_batch.max(1));

    for chunk in wanted_ids.chunks(config.query_batch.max(1)) {
        if cancel.is_cancelled() {
            debug!("pipeline cancelled during update phase");
            return Ok(());
        }

        let cursor = source.query_contacts(chunk, REQUESTED_COLUMNS).await;
        let mut cursor = match cursor {
            Some(cursor) => cursor,
            None => {
                stats.contacts_update_failed += chunk.len() as u64;
                stats.record_update_result(ErrorCode::SourceUnavailable);
                return Err(SyncError::SourceUnavailable(
                    "source returned no cursor for query_contacts".into(),
                ));
            }
        };

        let mut sink = ClassifyingSink { inner: &mut batcher, known_ids, inserted: 0, updated: 0 };
        let decode_result = decode_cursor(cursor.as_mut(), &mut sink).await;
        let decoded = sink.inserted + sink.updated;

        match decode_result {
            Ok(()) => {
                stats.contacts_inserted += sink.inserted as u64;
                stats.contacts_updated += sink.updated as u64;
                stats.record_update_result(ErrorCode::Success);
            }
            Err(e) => {
                error!(error = %e, chunk_len = chunk.len(), "update chunk failed, aborting run");
                stats.contacts_inserted += sink.inserted as u64;
                stats.contacts_updated += sink.updated as u64;
                stats.contacts_update_failed += (chunk.len() - decoded.min(chunk.len())) as u64;
                stats.record_update_result(e.code());
                return Err(e);
            }
        }
    }

    batcher.flush().await?;
    stats.record_update_result(ErrorCode::Success);
    Ok(())
}
