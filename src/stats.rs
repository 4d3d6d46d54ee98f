//! Per-run counters and result-code sets.

use std::collections::HashSet;
use std::fmt;

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    Unknown,
    Delta,
    Full,
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateType::Unknown => "unknown",
            UpdateType::Delta => "delta",
            UpdateType::Full => "full",
        };
        f.write_str(s)
    }
}

/// Counters and result-code sets for one engine run. Created per run,
/// logged and dropped at its conclusion.
#[derive(Debug)]
pub struct UpdateStats {
    pub update_type: UpdateType,
    pub start_time_ms: i64,
    update_statuses: HashSet<ErrorCode>,
    delete_statuses: HashSet<ErrorCode>,
    /// Wanted ids not already present in the store before this run. Only a
    /// full update knows the store's prior contents cheaply (it already
    /// enumerates them to compute deletions); delta runs fold every
    /// successfully-decoded contact into `contacts_updated` instead of
    /// paying for a store-wide id scan just to classify it.
    pub contacts_inserted: u64,
    pub contacts_updated: u64,
    pub contacts_deleted: u64,
    pub contacts_update_failed: u64,
    pub contacts_delete_failed: u64,
}

impl UpdateStats {
    pub fn new(update_type: UpdateType, start_time_ms: i64) -> Self {
        UpdateStats {
            update_type,
            start_time_ms,
            update_statuses: HashSet::new(),
            delete_statuses: HashSet::new(),
            contacts_inserted: 0,
            contacts_updated: 0,
            contacts_deleted: 0,
            contacts_update_failed: 0,
            contacts_delete_failed: 0,
        }
    }

    pub fn record_update_result(&mut self, code: ErrorCode) {
        record_result(&mut self.update_statuses, code);
    }

    pub fn record_delete_result(&mut self, code: ErrorCode) {
        record_result(&mut self.delete_statuses, code);
    }

    pub fn update_statuses(&self) -> &HashSet<ErrorCode> {
        &self.update_statuses
    }

    pub fn delete_statuses(&self) -> &HashSet<ErrorCode> {
        &self.delete_statuses
    }

    pub fn update_succeeded(&self) -> bool {
        !self.update_statuses.contains(&ErrorCode::SourceUnavailable)
            && !self.update_statuses.contains(&ErrorCode::SourceDecodeError)
            && !self.update_statuses.contains(&ErrorCode::StoreInternalError)
            && !self.update_statuses.contains(&ErrorCode::StoreOutOfSpace)
    }

    /// Whether every delete chunk in this run succeeded. Unlike a run's
    /// overall future (which a delete-chunk failure never fails, per §4.4),
    /// the delta-delete watermark must not advance past a failed chunk, so
    /// the scheduler checks this independently (see DESIGN.md).
    pub fn delete_succeeded(&self) -> bool {
        self.delete_statuses.iter().all(|code| *code == ErrorCode::Success)
    }
}

impl fmt::Display for UpdateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} update: inserted={} updated={} deleted={} update_failed={} delete_failed={} update_statuses={:?} delete_statuses={:?}",
            self.update_type,
            self.contacts_inserted,
            self.contacts_updated,
            self.contacts_deleted,
            self.contacts_update_failed,
            self.contacts_delete_failed,
            self.update_statuses,
            self.delete_statuses,
        )
    }
}

/// Success is a singleton; any failure code evicts it and accumulates
/// alongside any other distinct failure codes already observed.
fn record_result(set: &mut HashSet<ErrorCode>, code: ErrorCode) {
    if code == ErrorCode::Success {
        if set.is_empty() {
            set.insert(ErrorCode::Success);
        }
    } else {
        set.remove(&ErrorCode::Success);
        set.insert(code);
    }
}
