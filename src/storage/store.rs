//! Event store seam.
//!
//! The ingest and insight handlers talk to storage only through
//! [`EventStore`]. [`InMemoryEventStore`] backs tests and local runs.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use super::models::{EventRecord, NewEvent, StorageMode};
use crate::validation::event::Severity;

/// Storage failures surfaced to handlers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("insert failed: {0}")]
    InsertFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Read/write access to the event log.
pub trait EventStore: Send + Sync {
    fn mode(&self) -> StorageMode;

    /// Persist an event and return its id.
    fn insert_event(&self, event: &NewEvent) -> Result<String, StoreError>;

    /// Events with `ts >= since`, newest first, at most `limit`.
    fn list_events_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError>;

    /// Error-severity events, newest first, at most `limit`.
    fn list_latest_errors(&self, limit: usize) -> Result<Vec<EventRecord>, StoreError>;
}

/// Process-local event store.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<EventRecord>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Insert an already-shaped record, bypassing validation.
    pub fn push_record(&self, record: EventRecord) {
        self.events.write().push(record);
    }

    fn newest_first(mut records: Vec<EventRecord>) -> Vec<EventRecord> {
        records.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        records
    }
}

impl EventStore for InMemoryEventStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Memory
    }

    fn insert_event(&self, event: &NewEvent) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let record = EventRecord::from_new(&id, event, Utc::now());
        self.events.write().push(record);
        Ok(id)
    }

    fn list_events_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let matching: Vec<EventRecord> = self
            .events
            .read()
            .iter()
            .filter(|e| e.timestamp().map(|ts| ts >= since).unwrap_or(false))
            .cloned()
            .collect();
        let mut out = Self::newest_first(matching);
        out.truncate(limit);
        Ok(out)
    }

    fn list_latest_errors(&self, limit: usize) -> Result<Vec<EventRecord>, StoreError> {
        let matching: Vec<EventRecord> = self
            .events
            .read()
            .iter()
            .filter(|e| e.is_severity(Severity::Error))
            .cloned()
            .collect();
        let mut out = Self::newest_first(matching);
        out.truncate(limit);
        Ok(out)
    }
}
