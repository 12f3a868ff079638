// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]

//! # tap-datadog
//!
//! A Singer tap that extracts SLO history, a metric time series and daily log
//! aggregates from the Datadog API, emitting `SCHEMA`, `RECORD` and `STATE`
//! messages on stdout.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_datadog::{config::TapConfig, engine::SyncEngine, http::HttpClient};
//! use tap_datadog::{state::StateManager, streams::discover};
//!
//! #[tokio::main]
//! async fn main() -> tap_datadog::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let client = HttpClient::from_tap_config(&config)?;
//!     let mut engine = SyncEngine::new(client, StateManager::from_file("state.json")?);
//!
//!     for stream in discover(&config) {
//!         let mut messages = Vec::new();
//!         engine.sync_stream(&stream, &mut messages).await?;
//!         for message in &messages {
//!             println!("{}", message.to_json()?);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        CLI (spec/check/discover/read)         │
//! └───────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬────────────┬─────┴───────┬────────────┬──────────┐
//! │  Streams  │ Pagination │   Engine    │    HTTP    │  State   │
//! ├───────────┼────────────┼─────────────┼────────────┼──────────┤
//! │ SLO       │ Day window │ SCHEMA      │ Retry      │ Bookmarks│
//! │ Metric    │ Host fan-  │ RECORD      │ Rate limit │ Atomic   │
//! │ Log aggr. │ out        │ STATE       │ DD-* auth  │ save     │
//! └───────────┴────────────┴─────────────┴────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Datadog key authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Day windows and host fan-out
pub mod pagination;

/// Response decoders
pub mod decode;

/// Bookmark state management
pub mod state;

/// Stream driver and Singer messages
pub mod engine;

/// Tap configuration
pub mod config;

/// Stream catalog and request builders
pub mod streams;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::TapConfig;
pub use engine::{Message, MessageSink, SyncConfig, SyncEngine};
pub use streams::{discover, StreamDescriptor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
