//! HTTP client module
//!
//! Provides HTTP client with retry, rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: 429, 5xx, timeouts and connection errors are retried with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Datadog Throttling**: honours `Retry-After` and `X-RateLimit-Reset`
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
