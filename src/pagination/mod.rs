//! Pagination module
//!
//! Supports: day-stepping time windows, host fan-out
//!
//! # Overview
//!
//! Each strategy hands the driver one page token at a time and is advanced
//! once the page has been consumed. Time-windowed streams also yield the
//! bookmark to persist for the next run.

mod fanout;
mod types;
mod window;

pub use fanout::HostFanout;
pub use types::{PageToken, PaginationConfig, Paginator};
pub use window::{
    floor_to_month_start, month_start, parse_start_date, CursorState, Window, WindowAnchor,
    WindowCursor,
};
