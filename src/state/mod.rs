//! State management module
//!
//! Tracks per-stream bookmarks so repeated runs resume where the last one
//! stopped. The persisted shape is the Singer one:
//!
//! ```json
//! {"bookmarks": {"slo_history_us_prod": {"to_ts": 1705622400}}}
//! ```
//!
//! # Overview
//!
//! - `State` - bookmarks keyed by stream, then by field
//! - `StateManager` - file or inline persistence with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::State;
