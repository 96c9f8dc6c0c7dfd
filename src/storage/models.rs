//! Event models.
//!
//! These models represent rows of the `sitrep_events` table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::validation::event::{parse_timestamp, EventType, Severity};

/// Backend label reported by an [`EventStore`](super::store::EventStore).
///
/// This crate ships the in-memory store; SQLite and Supabase stores are
/// implemented by the host against the same trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Sqlite,
    Supabase,
    Memory,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Sqlite => "sqlite",
            StorageMode::Supabase => "supabase",
            StorageMode::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated event ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEvent {
    pub ts: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub app: String,
    pub severity: Severity,
    pub message: String,
    pub tags: Map<String, Value>,
    pub meta: Map<String, Value>,
}

/// String fields from external rows: anything but a string is absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Row ids may be text or integers depending on the backend.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// `tags`/`meta` columns: `null` or a non-object is an empty map.
fn lenient_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// A stored event as read back from any backend.
///
/// Every field is optional and mistyped fields are dropped: rows come
/// from external stores and the insight computation must tolerate
/// partial records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ts: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", rename = "type")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_object", skip_serializing_if = "Map::is_empty")]
    pub tags: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_object", skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl EventRecord {
    /// Build the stored form of a freshly inserted event.
    pub fn from_new(id: &str, event: &NewEvent, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(id.to_string()),
            ts: Some(event.ts.clone()),
            source: Some(event.source.clone()),
            event_type: Some(event.event_type.as_str().to_string()),
            app: Some(event.app.clone()),
            severity: Some(event.severity.as_str().to_string()),
            message: Some(event.message.clone()),
            tags: event.tags.clone(),
            meta: event.meta.clone(),
            created_at: Some(created_at.to_rfc3339()),
        }
    }

    /// Read a record from an arbitrary JSON value. Non-objects yield an
    /// empty record.
    pub fn from_value_lenient(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Parsed `ts`, if present and a valid ISO 8601 timestamp.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.ts.as_deref().and_then(parse_timestamp)
    }

    /// String value of a `meta` entry.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    pub fn is_type(&self, event_type: EventType) -> bool {
        self.event_type.as_deref() == Some(event_type.as_str())
    }

    pub fn is_severity(&self, severity: Severity) -> bool {
        self.severity.as_deref() == Some(severity.as_str())
    }
}

/// Parse a JSON array of event rows. Only a non-array document is an
/// error; malformed elements become empty records.
pub fn parse_event_records(json: &str) -> Result<Vec<EventRecord>, serde_json::Error> {
    let rows: Vec<Value> = serde_json::from_str(json)?;
    Ok(rows.into_iter().map(EventRecord::from_value_lenient).collect())
}
