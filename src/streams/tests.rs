//! Tests for the stream catalog

use super::*;
use crate::config::{TapConfig, DEFAULT_US_PROD_SLO_ID};
use crate::decode::RecordDecoder;
use crate::error::Error;
use crate::pagination::{PageToken, PaginationConfig, Window, WindowAnchor};
use crate::types::{Method, ReplicationMethod};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn config() -> TapConfig {
    TapConfig::from_json_str(
        r#"{"api_key": "a", "app_key": "b", "start_date": "2024-01-15"}"#,
    )
    .unwrap()
}

fn stream(name: &str) -> StreamDescriptor {
    discover(&config())
        .into_iter()
        .find(|s| s.name == name)
        .unwrap()
}

fn window() -> PageToken {
    PageToken::Window(Window {
        from_ts: 1_704_067_200,
        to_ts: 1_704_153_600,
    })
}

fn host(index: usize, host: &str) -> PageToken {
    PageToken::Host {
        index,
        host: host.to_string(),
    }
}

// ============================================================================
// Discovery Tests
// ============================================================================

#[test]
fn test_discover_defaults() {
    let names: Vec<String> = discover(&config()).into_iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec![AGGREGATE_LOGS, METRIC_RESPONSE_TIME, SLO_HISTORY_US_PROD]
    );
}

#[test]
fn test_discover_all_regions() {
    let config = TapConfig::from_json_str(
        r#"{
            "api_key": "a", "app_key": "b",
            "slo_ids": {"eu_prod": "eu-slo", "ca_prod": "ca-slo"}
        }"#,
    )
    .unwrap();

    let streams = discover(&config);
    let names: Vec<&str> = streams.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            AGGREGATE_LOGS,
            METRIC_RESPONSE_TIME,
            SLO_HISTORY_US_PROD,
            SLO_HISTORY_EU_PROD,
            SLO_HISTORY_CA_PROD
        ]
    );
    assert_eq!(
        streams[3].kind,
        StreamKind::SloHistory {
            slo_id: "eu-slo".to_string()
        }
    );
}

#[test]
fn test_discover_skips_blank_slo_id() {
    let config = TapConfig::from_json_str(
        r#"{"api_key": "a", "app_key": "b", "slo_ids": {"us_prod": "", "eu_prod": "  "}}"#,
    )
    .unwrap();

    assert!(discover(&config)
        .iter()
        .all(|s| !matches!(s.kind, StreamKind::SloHistory { .. })));
}

#[test]
fn test_descriptor_shapes() {
    let slo = stream(SLO_HISTORY_US_PROD);
    assert_eq!(slo.method(), Method::GET);
    assert_eq!(
        slo.path(),
        format!("/api/v1/slo/{DEFAULT_US_PROD_SLO_ID}/history")
    );
    assert_eq!(slo.records_path, "$.data");
    assert_eq!(slo.bookmark_field.as_deref(), Some("to_ts"));
    assert_eq!(slo.replication_method(), ReplicationMethod::Incremental);
    assert!(slo.pagination.is_incremental());

    let metric = stream(METRIC_RESPONSE_TIME);
    assert_eq!(metric.method(), Method::GET);
    assert_eq!(metric.path(), "/api/v1/query");
    assert_eq!(metric.records_path, "$.series[*]");
    assert_eq!(metric.bookmark_field.as_deref(), Some("to_date"));

    let logs = stream(AGGREGATE_LOGS);
    assert_eq!(logs.method(), Method::POST);
    assert_eq!(logs.path(), "/api/v2/logs/analytics/aggregate");
    assert_eq!(logs.records_path, "$.data.buckets[*]");
    assert!(logs.bookmark_field.is_none());
    assert_eq!(logs.replication_method(), ReplicationMethod::FullTable);
    assert!(matches!(
        logs.pagination,
        PaginationConfig::HostFanout { ref hosts } if hosts.len() == 3
    ));
}

#[test]
fn test_window_anchor_flows_into_pagination() {
    let config = TapConfig::from_json_str(
        r#"{"api_key": "a", "app_key": "b", "window_anchor": "rolling"}"#,
    )
    .unwrap();
    let metric = discover(&config)
        .into_iter()
        .find(|s| s.name == METRIC_RESPONSE_TIME)
        .unwrap();
    assert!(matches!(
        metric.pagination,
        PaginationConfig::Window {
            anchor: WindowAnchor::Rolling
        }
    ));
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_select_keeps_catalog_order() {
    let selected = select(
        discover(&config()),
        &[SLO_HISTORY_US_PROD.to_string(), AGGREGATE_LOGS.to_string()],
    )
    .unwrap();
    let names: Vec<&str> = selected.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec![AGGREGATE_LOGS, SLO_HISTORY_US_PROD]);
}

#[test]
fn test_select_empty_keeps_all() {
    assert_eq!(select(discover(&config()), &[]).unwrap().len(), 3);
}

#[test]
fn test_select_unknown_stream() {
    let err = select(discover(&config()), &["slo_history_eu_prod".to_string()]).unwrap_err();
    assert!(matches!(err, Error::StreamNotFound { ref stream } if stream == "slo_history_eu_prod"));
}

// ============================================================================
// Request Builder Tests
// ============================================================================

#[test]
fn test_slo_request() {
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
    let request = build_request(&stream(SLO_HISTORY_US_PROD), &window(), now).unwrap();

    assert_eq!(request.method, Method::GET);
    assert_eq!(
        request.query,
        vec![
            ("from_ts".to_string(), "1704067200".to_string()),
            ("to_ts".to_string(), "1704153600".to_string())
        ]
    );
    assert!(request.body.is_none());
}

#[test]
fn test_metric_request() {
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
    let request = build_request(&stream(METRIC_RESPONSE_TIME), &window(), now).unwrap();

    assert_eq!(
        request.query,
        vec![
            ("from".to_string(), "1704067200".to_string()),
            ("to".to_string(), "1704153600".to_string()),
            (
                "query".to_string(),
                "avg:trace.aspnet_core.request.duration{service:degreed.api}".to_string()
            )
        ]
    );
}

#[test]
fn test_aggregate_logs_request() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 5, 30, 0).unwrap();
    let request = build_request(
        &stream(AGGREGATE_LOGS),
        &host(1, "api.eu.degreed.com"),
        now,
    )
    .unwrap();

    assert_eq!(request.method, Method::POST);
    assert!(request.query.is_empty());

    let body = request.body.unwrap();
    let filter = &body["filter"];
    assert!(filter["query"]
        .as_str()
        .unwrap()
        .ends_with(" host:api.eu.degreed.com"));
    assert!(filter["query"]
        .as_str()
        .unwrap()
        .starts_with("source:degreed.api"));
    // Leap year: the prior day of March 1st is February 29th
    assert_eq!(filter["from"], "2024-02-29T00:00:00+00:00");
    assert_eq!(filter["to"], "2024-02-29T23:59:59+00:00");
    assert_eq!(filter["indexes"], json!(["main"]));

    assert_eq!(body["compute"][0], json!({"aggregation": "count", "type": "total"}));
    assert_eq!(body["compute"][1]["metric"], "@Properties.Elapsed");
    assert_eq!(body["group_by"].as_array().unwrap().len(), 4);
    assert_eq!(body["group_by"][1], json!({"facet": "host"}));
}

#[test]
fn test_previous_utc_day() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(previous_utc_day(now).to_string(), "2023-12-31");
}

#[test]
fn test_mismatched_token_is_error() {
    let now = Utc::now();
    assert!(build_request(&stream(AGGREGATE_LOGS), &window(), now).is_err());
    assert!(build_request(&stream(SLO_HISTORY_US_PROD), &host(0, "h"), now).is_err());
}

#[test]
fn test_request_config_conversion() {
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
    let request = build_request(&stream(METRIC_RESPONSE_TIME), &window(), now).unwrap();
    let config = request.to_request_config();
    assert_eq!(config.query, request.query);
    assert!(config.body.is_none());

    let request = build_request(&stream(AGGREGATE_LOGS), &host(0, "api.degreed.com"), now).unwrap();
    assert_eq!(request.to_request_config().body, request.body);
}

// ============================================================================
// Record Enrichment Tests
// ============================================================================

#[test]
fn test_enrich_slo_record() {
    let record = stream(SLO_HISTORY_US_PROD)
        .enrich(json!({"to_ts": 1}), &window())
        .unwrap();
    assert_eq!(record, json!({"to_ts": 1, "slo_id": DEFAULT_US_PROD_SLO_ID}));
}

#[test]
fn test_enrich_metric_record() {
    let record = stream(METRIC_RESPONSE_TIME)
        .enrich(json!({"metric": "m", "query": "stale"}), &window())
        .unwrap();
    assert_eq!(
        record["query"],
        "avg:trace.aspnet_core.request.duration{service:degreed.api}"
    );
}

#[test]
fn test_enrich_tags_host() {
    let logs = stream(AGGREGATE_LOGS);
    for (i, name) in ["api.degreed.com", "api.eu.degreed.com", "api.ca.degreed.com"]
        .iter()
        .enumerate()
    {
        let record = logs.enrich(json!({"by": {}}), &host(i, name)).unwrap();
        assert_eq!(record["host"], *name);
    }
}

#[test]
fn test_enrich_rejects_non_object() {
    let err = stream(METRIC_RESPONSE_TIME)
        .enrich(json!([1, 2]), &window())
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn test_decoder_uses_records_path() {
    let decoder = stream(SLO_HISTORY_US_PROD).decoder();
    let records = decoder.decode(r#"{"data": {"to_ts": 5}}"#).unwrap();
    assert_eq!(records, vec![json!({"to_ts": 5})]);
}

// ============================================================================
// Schema / Catalog Tests
// ============================================================================

#[test]
fn test_schemas_include_passthrough_fields() {
    assert!(stream(SLO_HISTORY_US_PROD).schema()["properties"]["slo_id"].is_object());
    assert!(stream(METRIC_RESPONSE_TIME).schema()["properties"]["query"].is_object());
    assert!(stream(AGGREGATE_LOGS).schema()["properties"]["host"].is_object());
}

#[test]
fn test_slo_schema_type_ids_are_integers() {
    let schema = stream(SLO_HISTORY_US_PROD).schema();
    assert_eq!(
        schema["properties"]["type_id"]["type"],
        json!(["integer", "null"])
    );
    assert_eq!(
        schema["properties"]["slo"]["properties"]["type_id"]["type"],
        json!(["integer", "null"])
    );
}

#[test]
fn test_catalog_entry() {
    let entry = stream(SLO_HISTORY_US_PROD).catalog_entry();
    assert_eq!(entry["tap_stream_id"], SLO_HISTORY_US_PROD);
    assert_eq!(entry["replication_method"], "INCREMENTAL");
    assert_eq!(entry["replication_key"], "to_ts");
    assert_eq!(entry["key_properties"], json!([]));
    assert_eq!(
        entry["metadata"][0]["metadata"]["valid-replication-keys"],
        json!(["to_ts"])
    );

    let entry = stream(AGGREGATE_LOGS).catalog_entry();
    assert_eq!(entry["replication_method"], "FULL_TABLE");
    assert!(entry["replication_key"].is_null());
}
