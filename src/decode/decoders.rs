//! JSON decoder implementation

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde_json::Value;

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// JSONPath to extract records
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// Configured record path
    pub fn record_path(&self) -> Option<&str> {
        self.record_path.as_deref()
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let value = self.decode_raw(body)?;
        self.extract(&value)
    }

    fn decode_raw(&self, body: &str) -> Result<Value> {
        serde_json::from_str(body).map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
    }

    fn extract(&self, value: &Value) -> Result<Vec<Value>> {
        let records = match self.record_path.as_deref() {
            Some(path) if path.contains('*') => extract_with_jsonpath(value, path)?,
            Some(path) => match extract_simple_path(value, path) {
                Some(Value::Array(arr)) => arr,
                Some(v) => vec![v],
                None => vec![],
            },
            None => match value {
                Value::Array(arr) => arr.clone(),
                _ => vec![value.clone()],
            },
        };

        // A `null` payload (e.g. SLO history for a window with no data) is no records
        Ok(records.into_iter().filter(|r| !r.is_null()).collect())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract a value using simple dot-notation path
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.trim();
    if path == "$" || path.is_empty() {
        return Some(value.clone());
    }
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        // Handle array indexing like "series[0]"
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index: usize = part[bracket_pos + 1..].strip_suffix(']')?.parse().ok()?;

            if !name.is_empty() {
                current = current.get(name)?;
            }
            current = current.as_array()?.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
