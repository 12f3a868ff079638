//! Host fan-out pagination
//!
//! Pages over a fixed list of hosts. Every page issues the same query with a
//! different host filter; there is no time dimension and no bookmark.

use super::types::{PageToken, Paginator};
use crate::types::Timestamp;
use chrono::{DateTime, Utc};

/// Paginator over a fixed host list
#[derive(Debug, Clone)]
pub struct HostFanout {
    hosts: Vec<String>,
    /// Index of the next page; equal to `hosts.len()` once drained
    index: usize,
}

impl HostFanout {
    /// Create a fan-out over the given hosts
    pub fn new(hosts: Vec<String>) -> Self {
        Self { hosts, index: 0 }
    }

    /// Hosts being paged over
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Index following `current_index`, `None` past the last host
    pub fn next_index(&self, current_index: usize) -> Option<usize> {
        let next = current_index + 1;
        (next < self.hosts.len()).then_some(next)
    }

    /// Host at `index`
    pub fn host(&self, index: usize) -> Option<&str> {
        self.hosts.get(index).map(String::as_str)
    }
}

impl Paginator for HostFanout {
    fn next_page(&mut self, _now: DateTime<Utc>) -> Option<PageToken> {
        let host = self.host(self.index)?;
        Some(PageToken::Host {
            index: self.index,
            host: host.to_string(),
        })
    }

    fn advance(&mut self) {
        self.index = self.next_index(self.index).unwrap_or(self.hosts.len());
    }

    fn bookmark(&self) -> Option<Timestamp> {
        None
    }
}
