//! Auth configuration types

use std::collections::BTreeMap;
use std::fmt;

/// Header carrying the Datadog API key
pub const DD_API_KEY_HEADER: &str = "DD-API-KEY";

/// Header carrying the Datadog application key
pub const DD_APP_KEY_HEADER: &str = "DD-APPLICATION-KEY";

/// Authentication configuration
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Fixed set of headers sent with every request
    CustomHeaders {
        /// Header name to value
        headers: BTreeMap<String, String>,
    },
}

impl AuthConfig {
    /// Datadog key pair sent as `DD-API-KEY` and `DD-APPLICATION-KEY`
    pub fn datadog(api_key: impl Into<String>, app_key: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(DD_API_KEY_HEADER.to_string(), api_key.into());
        headers.insert(DD_APP_KEY_HEADER.to_string(), app_key.into());
        Self::CustomHeaders { headers }
    }
}

// Keys never reach logs
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::CustomHeaders { headers } => f
                .debug_struct("CustomHeaders")
                .field("headers", &headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}
