//! Tap configuration
//!
//! The JSON config file handed to the tap with `--config`. Credentials and
//! `start_date` are the only keys a typical deployment sets; everything else
//! has a default matching the production Datadog account.

use crate::error::{Error, Result};
use crate::pagination::{parse_start_date, WindowAnchor};
use crate::types::OptionStringExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Production US SLO monitored by the `slo_history_us_prod` stream
pub const DEFAULT_US_PROD_SLO_ID: &str = "e96fa5aa00dc57af8718c8e7044b0f51";

/// Default Datadog API root
pub const DEFAULT_BASE_URL: &str = "https://api.datadoghq.com";

// ============================================================================
// Top-Level Tap Config
// ============================================================================

/// Complete tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Datadog API key (`DD-API-KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Datadog application key (`DD-APPLICATION-KEY`)
    #[serde(default)]
    pub app_key: Option<String>,

    /// First day to sync from (`YYYY-MM-DD`), used when no bookmark exists
    #[serde(default)]
    pub start_date: Option<String>,

    /// API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// SLO identifiers per region
    #[serde(default)]
    pub slo_ids: SloIds,

    /// Metric query for the `metric_response_time` stream
    #[serde(default = "default_metric_query")]
    pub metric_query: String,

    /// Log search query for the `aggregate_logs` stream (host filter is appended)
    #[serde(default = "default_log_query")]
    pub log_query: String,

    /// Hosts the `aggregate_logs` stream fans out over
    #[serde(default = "default_log_hosts")]
    pub log_hosts: Vec<String>,

    /// How window start timestamps are derived
    #[serde(default)]
    pub window_anchor: WindowAnchor,

    /// HTTP client settings
    #[serde(flatten)]
    pub http: HttpConfig,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            app_key: None,
            start_date: None,
            base_url: default_base_url(),
            slo_ids: SloIds::default(),
            metric_query: default_metric_query(),
            log_query: default_log_query(),
            log_hosts: default_log_hosts(),
            window_anchor: WindowAnchor::default(),
            http: HttpConfig::default(),
        }
    }
}

impl TapConfig {
    /// Parse a config from a JSON string and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Check required keys and value shapes
    ///
    /// `start_date` is only required on a first run, so its presence is
    /// checked by the window cursor. A present one must still be well formed.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.clone().none_if_empty().is_none() {
            return Err(Error::missing_field("api_key"));
        }
        if self.app_key.clone().none_if_empty().is_none() {
            return Err(Error::missing_field("app_key"));
        }

        if let Some(start_date) = self.start_date.clone().none_if_empty() {
            parse_start_date(&start_date)?;
        }

        let url = url::Url::parse(&self.base_url).map_err(|e| {
            Error::invalid_value("base_url", format!("'{}': {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.log_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(Error::invalid_value("log_hosts", "host names must not be empty"));
        }

        if self.http.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// API key, empty string if unset
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    /// Application key, empty string if unset
    pub fn app_key(&self) -> &str {
        self.app_key.as_deref().unwrap_or_default()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_metric_query() -> String {
    "avg:trace.aspnet_core.request.duration{service:degreed.api}".to_string()
}

fn default_log_query() -> String {
    r#"source:degreed.api @MessageTemplate:"HTTP {RequestMethod} {RequestPath} responded {StatusCode} in {Elapsed:0.0000} ms""#
        .to_string()
}

fn default_log_hosts() -> Vec<String> {
    vec![
        "api.degreed.com".to_string(),
        "api.eu.degreed.com".to_string(),
        "api.ca.degreed.com".to_string(),
    ]
}

// ============================================================================
// SLO Identifiers
// ============================================================================

/// SLO identifiers for the per-region SLO history streams
///
/// A region without an id is left out of discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SloIds {
    #[serde(default = "default_us_prod")]
    pub us_prod: Option<String>,

    #[serde(default)]
    pub eu_prod: Option<String>,

    #[serde(default)]
    pub ca_prod: Option<String>,
}

impl Default for SloIds {
    fn default() -> Self {
        Self {
            us_prod: default_us_prod(),
            eu_prod: None,
            ca_prod: None,
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_us_prod() -> Option<String> {
    Some(DEFAULT_US_PROD_SLO_ID.to_string())
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Requests per second limit (None disables rate limiting)
    #[serde(default = "default_rps")]
    pub requests_per_second: Option<u32>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            requests_per_second: default_rps(),
            user_agent: None,
        }
    }
}

impl HttpConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

#[allow(clippy::unnecessary_wraps)]
fn default_rps() -> Option<u32> {
    Some(10)
}
