//! Stream descriptor types

use super::schemas;
use crate::decode::JsonDecoder;
use crate::error::{Error, Result};
use crate::pagination::{PageToken, PaginationConfig};
use crate::types::{JsonObject, JsonValue, Method, ReplicationMethod};
use serde_json::json;

/// What a stream queries; carries the values that vary between streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamKind {
    /// `GET /api/v1/slo/{slo_id}/history`
    SloHistory {
        /// SLO identifier
        slo_id: String,
    },
    /// `GET /api/v1/query`
    MetricQuery {
        /// Metric query string
        query: String,
    },
    /// `POST /api/v2/logs/analytics/aggregate`
    AggregateLogs {
        /// Log search query, without the host filter
        query: String,
    },
}

/// Everything the sync engine needs to run one stream
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    /// Stream name (`tap_stream_id`)
    pub name: String,
    /// Endpoint-specific parameters
    pub kind: StreamKind,
    /// JSON path to the records in each response
    pub records_path: String,
    /// State field holding the bookmark; `None` for full-table streams
    pub bookmark_field: Option<String>,
    /// How pages are produced
    pub pagination: PaginationConfig,
}

impl StreamDescriptor {
    /// Create a descriptor
    pub fn new(
        name: impl Into<String>,
        kind: StreamKind,
        records_path: impl Into<String>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            records_path: records_path.into(),
            bookmark_field: None,
            pagination,
        }
    }

    /// Set the bookmark field
    #[must_use]
    pub fn with_bookmark_field(mut self, field: impl Into<String>) -> Self {
        self.bookmark_field = Some(field.into());
        self
    }

    /// HTTP method of every request
    pub fn method(&self) -> Method {
        match self.kind {
            StreamKind::AggregateLogs { .. } => Method::POST,
            StreamKind::SloHistory { .. } | StreamKind::MetricQuery { .. } => Method::GET,
        }
    }

    /// Request path, relative to the API root
    pub fn path(&self) -> String {
        match &self.kind {
            StreamKind::SloHistory { slo_id } => format!("/api/v1/slo/{slo_id}/history"),
            StreamKind::MetricQuery { .. } => "/api/v1/query".to_string(),
            StreamKind::AggregateLogs { .. } => "/api/v2/logs/analytics/aggregate".to_string(),
        }
    }

    /// Replication method advertised in the catalog
    pub fn replication_method(&self) -> ReplicationMethod {
        if self.bookmark_field.is_some() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        }
    }

    /// Decoder for this stream's responses
    pub fn decoder(&self) -> JsonDecoder {
        JsonDecoder::with_path(self.records_path.clone())
    }

    /// JSON schema of the emitted records, passthrough fields included
    pub fn schema(&self) -> JsonValue {
        match self.kind {
            StreamKind::SloHistory { .. } => schemas::slo_history(),
            StreamKind::MetricQuery { .. } => schemas::metric_series(),
            StreamKind::AggregateLogs { .. } => schemas::aggregate_logs(),
        }
    }

    /// Fields copied onto every record of a page
    pub fn passthrough(&self, token: &PageToken) -> JsonObject {
        let mut fields = JsonObject::new();
        match &self.kind {
            StreamKind::SloHistory { slo_id } => {
                fields.insert("slo_id".to_string(), json!(slo_id));
            }
            StreamKind::MetricQuery { query } => {
                fields.insert("query".to_string(), json!(query));
            }
            StreamKind::AggregateLogs { .. } => {
                if let Some(host) = token.host() {
                    fields.insert("host".to_string(), json!(host));
                }
            }
        }
        fields
    }

    /// Add the passthrough fields to a record
    ///
    /// Passthrough values win over same-named keys already in the record.
    pub fn enrich(&self, record: JsonValue, token: &PageToken) -> Result<JsonValue> {
        let JsonValue::Object(mut object) = record else {
            return Err(Error::decode(format!(
                "Stream '{}' produced a non-object record",
                self.name
            )));
        };
        object.extend(self.passthrough(token));
        Ok(JsonValue::Object(object))
    }

    /// Singer catalog entry
    pub fn catalog_entry(&self) -> JsonValue {
        let mut stream_metadata = json!({
            "inclusion": "available",
            "selected": true,
            "table-key-properties": [],
            "forced-replication-method": self.replication_method(),
        });
        if let Some(field) = &self.bookmark_field {
            stream_metadata["valid-replication-keys"] = json!([field]);
        }

        json!({
            "tap_stream_id": self.name,
            "stream": self.name,
            "schema": self.schema(),
            "key_properties": [],
            "replication_method": self.replication_method(),
            "replication_key": self.bookmark_field,
            "metadata": [
                {"breadcrumb": [], "metadata": stream_metadata}
            ],
        })
    }
}
