//! Per-stream request builder
//!
//! Turns a page token into the concrete request for a stream. Pure: no I/O,
//! the clock is passed in.

use super::types::{StreamDescriptor, StreamKind};
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::pagination::{PageToken, Window};
use crate::types::{JsonValue, Method};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde_json::json;

/// A fully resolved request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    /// Path relative to the API root
    pub path: String,
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<JsonValue>,
}

impl RequestSpec {
    /// Convert into the HTTP client's request config
    pub fn to_request_config(&self) -> RequestConfig {
        let mut config = self
            .query
            .iter()
            .fold(RequestConfig::new(), |config, (k, v)| config.query(k, v));
        if let Some(body) = &self.body {
            config = config.json(body.clone());
        }
        config
    }
}

/// Build the request for one page of a stream
pub fn build_request(
    stream: &StreamDescriptor,
    token: &PageToken,
    now: DateTime<Utc>,
) -> Result<RequestSpec> {
    let path = stream.path();
    let method = stream.method();

    match (&stream.kind, token) {
        (StreamKind::SloHistory { .. }, PageToken::Window(window)) => Ok(RequestSpec {
            method,
            path,
            query: window_params("from_ts", "to_ts", *window),
            body: None,
        }),

        (StreamKind::MetricQuery { query }, PageToken::Window(window)) => {
            let mut params = window_params("from", "to", *window);
            params.push(("query".to_string(), query.clone()));
            Ok(RequestSpec {
                method,
                path,
                query: params,
                body: None,
            })
        }

        (StreamKind::AggregateLogs { query }, PageToken::Host { host, .. }) => Ok(RequestSpec {
            method,
            path,
            query: Vec::new(),
            body: Some(aggregate_body(query, host, previous_utc_day(now))),
        }),

        (kind, token) => Err(Error::Other(format!(
            "Stream '{}' ({kind:?}) cannot page with {token:?}",
            stream.name
        ))),
    }
}

/// The UTC calendar day before `now`
pub fn previous_utc_day(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

fn window_params(from_key: &str, to_key: &str, window: Window) -> Vec<(String, String)> {
    vec![
        (from_key.to_string(), window.from_ts.to_string()),
        (to_key.to_string(), window.to_ts.to_string()),
    ]
}

/// Log analytics aggregate request for a single host over a whole day
fn aggregate_body(query: &str, host: &str, day: NaiveDate) -> JsonValue {
    let day = day.format("%Y-%m-%d");
    json!({
        "compute": [
            {"aggregation": "count", "type": "total"},
            {"aggregation": "sum", "type": "total", "metric": "@Properties.Elapsed"}
        ],
        "filter": {
            "query": format!("{query} host:{host}"),
            "from": format!("{day}T00:00:00+00:00"),
            "to": format!("{day}T23:59:59+00:00"),
            "indexes": ["main"]
        },
        "group_by": [
            {"facet": "status"},
            {"facet": "host"},
            {"facet": "@http.status_code"},
            {"facet": "@Properties.OrganizationId"}
        ]
    })
}
