//! Response decoder module
//!
//! Extracts records from JSON response bodies using a configured path.
//! Wildcard paths (`$.series[*]`) go through jsonpath-rust; plain paths
//! (`$.data`) are walked directly.

mod decoders;
mod types;

pub use decoders::JsonDecoder;
pub use types::RecordDecoder;
