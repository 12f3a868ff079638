//! Authentication module
//!
//! Supports: static request headers
//!
//! Datadog authenticates every request with two static headers, so no token
//! exchange or caching is needed.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, DD_API_KEY_HEADER, DD_APP_KEY_HEADER};
