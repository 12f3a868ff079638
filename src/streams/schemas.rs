//! JSON schemas of the emitted records
//!
//! Every property is nullable; Datadog omits fields freely.

use crate::types::JsonValue;
use serde_json::json;

fn string() -> JsonValue {
    json!({"type": ["string", "null"]})
}

fn number() -> JsonValue {
    json!({"type": ["number", "null"]})
}

fn integer() -> JsonValue {
    json!({"type": ["integer", "null"]})
}

fn boolean() -> JsonValue {
    json!({"type": ["boolean", "null"]})
}

fn strings() -> JsonValue {
    json!({"type": ["array", "null"], "items": {"type": "string"}})
}

fn object(properties: JsonValue) -> JsonValue {
    json!({"type": ["object", "null"], "properties": properties})
}

fn root(properties: JsonValue) -> JsonValue {
    json!({"type": "object", "properties": properties})
}

/// `GET /api/v1/slo/{id}/history` `data` object
pub fn slo_history() -> JsonValue {
    let threshold = object(json!({
        "target": number(),
        "target_display": string(),
        "timeframe": string(),
        "warning": number(),
        "warning_display": string(),
    }));

    root(json!({
        "slo_id": string(),
        "from_ts": integer(),
        "to_ts": integer(),
        "type": string(),
        "type_id": integer(),
        "thresholds": {
            "type": ["object", "null"],
            "additionalProperties": threshold,
        },
        "overall": object(json!({
            "name": string(),
            "sli_value": number(),
            "span_precision": number(),
            "precision": {
                "type": ["object", "null"],
                "additionalProperties": {"type": ["number", "null"]},
            },
            "monitor_modified": integer(),
            "monitor_type": string(),
            "preview": boolean(),
            "uptime": number(),
        })),
        "slo": object(json!({
            "id": string(),
            "name": string(),
            "description": string(),
            "type": string(),
            "type_id": integer(),
            "creator": {"type": ["object", "string", "null"]},
            "created_at": integer(),
            "modified_at": integer(),
            "monitor_ids": {"type": ["array", "null"], "items": {"type": "integer"}},
            "monitor_tags": strings(),
            "tags": strings(),
            "thresholds": {"type": ["array", "null"], "items": threshold},
        })),
    }))
}

/// One element of `GET /api/v1/query` `series`
pub fn metric_series() -> JsonValue {
    root(json!({
        "query": string(),
        "metric": string(),
        "display_name": string(),
        "expression": string(),
        "scope": string(),
        "aggr": string(),
        "tag_set": strings(),
        "start": integer(),
        "end": integer(),
        "interval": integer(),
        "length": integer(),
        "query_index": integer(),
        "pointlist": {
            "type": ["array", "null"],
            "items": {"type": "array", "items": {"type": ["number", "null"]}},
        },
        "unit": {
            "type": ["array", "null"],
            "items": {"type": ["object", "null"]},
        },
    }))
}

/// One element of `POST /api/v2/logs/analytics/aggregate` `data.buckets`
pub fn aggregate_logs() -> JsonValue {
    root(json!({
        "host": string(),
        "by": {
            "type": ["object", "null"],
            "additionalProperties": {"type": ["string", "number", "null"]},
        },
        "computes": {
            "type": ["object", "null"],
            "additionalProperties": {"type": ["number", "array", "null"]},
        },
    }))
}
