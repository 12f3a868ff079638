//! Stream discovery and selection

use super::types::{StreamDescriptor, StreamKind};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::pagination::PaginationConfig;
use crate::types::OptionStringExt;
use tracing::warn;

pub const AGGREGATE_LOGS: &str = "aggregate_logs";
pub const METRIC_RESPONSE_TIME: &str = "metric_response_time";
pub const SLO_HISTORY_US_PROD: &str = "slo_history_us_prod";
pub const SLO_HISTORY_EU_PROD: &str = "slo_history_eu_prod";
pub const SLO_HISTORY_CA_PROD: &str = "slo_history_ca_prod";

/// All streams the config enables, in sync order
pub fn discover(config: &TapConfig) -> Vec<StreamDescriptor> {
    let window = PaginationConfig::window(config.window_anchor);

    let mut streams = vec![
        StreamDescriptor::new(
            AGGREGATE_LOGS,
            StreamKind::AggregateLogs {
                query: config.log_query.clone(),
            },
            "$.data.buckets[*]",
            PaginationConfig::host_fanout(config.log_hosts.clone()),
        ),
        StreamDescriptor::new(
            METRIC_RESPONSE_TIME,
            StreamKind::MetricQuery {
                query: config.metric_query.clone(),
            },
            "$.series[*]",
            window.clone(),
        )
        .with_bookmark_field("to_date"),
    ];

    let slo_streams = [
        (SLO_HISTORY_US_PROD, &config.slo_ids.us_prod),
        (SLO_HISTORY_EU_PROD, &config.slo_ids.eu_prod),
        (SLO_HISTORY_CA_PROD, &config.slo_ids.ca_prod),
    ];
    for (name, slo_id) in slo_streams {
        let Some(slo_id) = slo_id.clone().none_if_empty() else {
            warn!(stream = name, "No SLO id configured, stream disabled");
            continue;
        };
        streams.push(
            StreamDescriptor::new(
                name,
                StreamKind::SloHistory { slo_id },
                "$.data",
                window.clone(),
            )
            .with_bookmark_field("to_ts"),
        );
    }

    streams
}

/// Restrict `streams` to `names`, keeping catalog order
///
/// An empty selection keeps everything. Unknown names are an error.
pub fn select(streams: Vec<StreamDescriptor>, names: &[String]) -> Result<Vec<StreamDescriptor>> {
    if names.is_empty() {
        return Ok(streams);
    }

    if let Some(unknown) = names
        .iter()
        .find(|name| !streams.iter().any(|s| &s.name == *name))
    {
        return Err(Error::StreamNotFound {
            stream: unknown.clone(),
        });
    }

    Ok(streams
        .into_iter()
        .filter(|s| names.contains(&s.name))
        .collect())
}
