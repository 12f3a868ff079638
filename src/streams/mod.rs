//! Stream catalog
//!
//! Every Datadog stream is one [`StreamDescriptor`]: endpoint, record path,
//! bookmark field, pagination strategy and passthrough fields. The sync engine
//! drives all of them through the same loop.
//!
//! # Streams
//!
//! - `aggregate_logs` - log analytics aggregate for the prior day, one page per host
//! - `metric_response_time` - metric timeseries over day windows
//! - `slo_history_{us,eu,ca}_prod` - SLO history over day windows

mod catalog;
mod query;
mod schemas;
mod types;

pub use catalog::{
    discover, select, AGGREGATE_LOGS, METRIC_RESPONSE_TIME, SLO_HISTORY_CA_PROD,
    SLO_HISTORY_EU_PROD, SLO_HISTORY_US_PROD,
};
pub use query::{build_request, previous_utc_day, RequestSpec};
pub use types::{StreamDescriptor, StreamKind};

#[cfg(test)]
mod tests;
