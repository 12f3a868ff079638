//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete tap state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmark objects
    #[serde(default)]
    pub bookmarks: BTreeMap<String, JsonObject>,

    /// Other top-level keys, kept as-is
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an epoch-seconds bookmark
    ///
    /// A missing stream or field is `Ok(None)`. A value that is present but not
    /// an integer is an error rather than a silent fresh start.
    pub fn get_bookmark(&self, stream: &str, field: &str) -> Result<Option<Timestamp>> {
        let Some(value) = self.bookmarks.get(stream).and_then(|b| b.get(field)) else {
            return Ok(None);
        };

        match value {
            JsonValue::Null => Ok(None),
            JsonValue::Number(n) => n.as_i64().map(Some).ok_or_else(|| {
                Error::invalid_bookmark(stream, format!("'{field}' is not an integer: {n}"))
            }),
            other => Err(Error::invalid_bookmark(
                stream,
                format!("'{field}' must be an integer epoch, found {other}"),
            )),
        }
    }

    /// Set an epoch-seconds bookmark, keeping other fields of the stream
    pub fn set_bookmark(&mut self, stream: &str, field: &str, value: Timestamp) {
        self.bookmarks
            .entry(stream.to_string())
            .or_default()
            .insert(field.to_string(), JsonValue::from(value));
    }
}
