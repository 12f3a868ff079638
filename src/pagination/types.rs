//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use super::fanout::HostFanout;
use super::window::{Window, WindowAnchor, WindowCursor};
use crate::error::Result;
use crate::types::Timestamp;
use chrono::{DateTime, Utc};
use std::fmt;

/// What a single page request covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// A time window
    Window(Window),
    /// One host of a fan-out
    Host {
        /// Position in the host list
        index: usize,
        /// Host name used as the query filter
        host: String,
    },
}

impl PageToken {
    /// The window, if this is a time-windowed page
    pub fn window(&self) -> Option<Window> {
        match self {
            Self::Window(w) => Some(*w),
            Self::Host { .. } => None,
        }
    }

    /// The host, if this is a fan-out page
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::Host { host, .. } => Some(host),
            Self::Window(_) => None,
        }
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(w) => write!(f, "[{}, {}]", w.from_ts, w.to_ts),
            Self::Host { index, host } => write!(f, "host #{index} {host}"),
        }
    }
}

/// Configuration for pagination behavior
#[derive(Debug, Clone)]
pub enum PaginationConfig {
    /// Day-stepping windows resumed from a bookmark
    Window {
        /// How window starts are derived
        anchor: WindowAnchor,
    },

    /// One page per host
    HostFanout {
        /// Hosts to page over
        hosts: Vec<String>,
    },
}

impl PaginationConfig {
    /// Create window pagination config
    pub fn window(anchor: WindowAnchor) -> Self {
        Self::Window { anchor }
    }

    /// Create host fan-out pagination config
    pub fn host_fanout(hosts: Vec<String>) -> Self {
        Self::HostFanout { hosts }
    }

    /// Whether this strategy produces a bookmark
    pub fn is_incremental(&self) -> bool {
        matches!(self, Self::Window { .. })
    }

    /// Build a fresh paginator for one run of a stream
    ///
    /// Only the window strategy consults `bookmark` and `start_date`.
    pub fn build(
        &self,
        bookmark: Option<Timestamp>,
        start_date: Option<&str>,
    ) -> Result<Box<dyn Paginator>> {
        match self {
            Self::Window { anchor } => Ok(Box::new(WindowCursor::new(
                bookmark, start_date, *anchor,
            )?)),
            Self::HostFanout { hosts } => Ok(Box::new(HostFanout::new(hosts.clone()))),
        }
    }
}

/// Core trait for pagination strategies
///
/// The driver calls `next_page`, issues the request, consumes the response,
/// then calls `advance`, until `next_page` returns `None`.
pub trait Paginator: Send + Sync {
    /// Token for the next request, or `None` when the stream is drained
    fn next_page(&mut self, now: DateTime<Utc>) -> Option<PageToken>;

    /// Move past the page just consumed
    fn advance(&mut self);

    /// Bookmark to persist when the stream completes
    fn bookmark(&self) -> Option<Timestamp>;

    /// Bookmark to persist right after the page for `token` was consumed
    fn checkpoint(&self, _token: &PageToken) -> Option<Timestamp> {
        None
    }
}
