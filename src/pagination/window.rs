//! Day-stepping time window cursor
//!
//! Walks forward one day at a time from a resume point (bookmark or
//! configured start date) until the next step would pass the current time.

use super::types::{PageToken, Paginator};
use crate::error::{Error, Result};
use crate::types::{Timestamp, SECONDS_PER_DAY};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Strict `YYYY-MM-DD`
static START_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

// ============================================================================
// Window
// ============================================================================

/// Query range of a single request, epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub from_ts: Timestamp,
    pub to_ts: Timestamp,
}

/// How a window's start is derived from its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAnchor {
    /// Every window starts at the first second of the month containing `to_ts`
    #[default]
    MonthStart,
    /// Every window starts where the previous one ended
    Rolling,
}

// ============================================================================
// Cursor State
// ============================================================================

/// Mutable cursor fields, owned by a single stream for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    /// End of the most recently requested (or next) window
    pub current_to_ts: Timestamp,
    /// Seeded from the start date rather than a bookmark
    pub first_run: bool,
    /// The last window has been handed out
    pub overreach: bool,
}

impl CursorState {
    /// Seed the cursor from a bookmark, falling back to the start date
    pub fn initialize(bookmark: Option<Timestamp>, start_date: Option<&str>) -> Result<Self> {
        if let Some(bookmark) = bookmark {
            let current_to_ts = bookmark
                .checked_add(SECONDS_PER_DAY)
                .filter(|ts| DateTime::from_timestamp(*ts, 0).is_some())
                .ok_or_else(|| Error::state(format!("Bookmark {bookmark} is out of range")))?;
            return Ok(Self {
                current_to_ts,
                first_run: false,
                overreach: false,
            });
        }

        let start_date = start_date.ok_or_else(|| {
            Error::config("start_date is required when no bookmark exists for the stream")
        })?;
        let date = parse_start_date(start_date)?;
        let month_start = month_start(date.year(), date.month()).ok_or_else(|| {
            Error::invalid_value("start_date", format!("'{start_date}' is out of range"))
        })?;

        Ok(Self {
            current_to_ts: month_start + SECONDS_PER_DAY,
            first_run: true,
            overreach: false,
        })
    }
}

// ============================================================================
// Window Cursor
// ============================================================================

/// Day-stepping cursor over `[from_ts, to_ts]` windows
#[derive(Debug, Clone)]
pub struct WindowCursor {
    state: CursorState,
    anchor: WindowAnchor,
    /// `to_ts` of the window before the current one (rolling anchor only)
    previous_to_ts: Option<Timestamp>,
    /// `now` of the latest `next_window` call
    horizon: Option<Timestamp>,
}

impl WindowCursor {
    /// Create a cursor from a bookmark or start date
    pub fn new(
        bookmark: Option<Timestamp>,
        start_date: Option<&str>,
        anchor: WindowAnchor,
    ) -> Result<Self> {
        Ok(Self::from_state(
            CursorState::initialize(bookmark, start_date)?,
            anchor,
        ))
    }

    /// Wrap an already initialized state
    pub fn from_state(state: CursorState, anchor: WindowAnchor) -> Self {
        Self {
            state,
            anchor,
            previous_to_ts: None,
            horizon: None,
        }
    }

    /// Current cursor fields
    pub fn state(&self) -> &CursorState {
        &self.state
    }

    /// Anchor in use
    pub fn anchor(&self) -> WindowAnchor {
        self.anchor
    }

    /// Next window to request, `None` once the final window was returned
    ///
    /// The window whose one-day lookahead reaches `now` is still returned and
    /// marks the cursor as overreached. A rolling window that would start at
    /// or after `now` is never returned.
    pub fn next_window(&mut self, now: DateTime<Utc>) -> Option<Window> {
        if self.state.overreach {
            return None;
        }

        let now = now.timestamp();
        self.horizon = Some(now);

        let to_ts = self.state.current_to_ts;
        let from_ts = match self.anchor {
            WindowAnchor::MonthStart => floor_to_month_start(to_ts),
            WindowAnchor::Rolling => {
                let from_ts = self.previous_to_ts.unwrap_or(to_ts - SECONDS_PER_DAY);
                if from_ts >= now {
                    self.state.overreach = true;
                    return None;
                }
                from_ts
            }
        };

        if to_ts + SECONDS_PER_DAY >= now {
            self.state.overreach = true;
        }

        Some(Window { from_ts, to_ts })
    }

    /// Step one day forward; no-op once overreached
    pub fn advance(&mut self) {
        if self.state.overreach {
            return;
        }
        self.previous_to_ts = Some(self.state.current_to_ts);
        self.state.current_to_ts += SECONDS_PER_DAY;
    }

    /// Value to persist as the stream bookmark
    ///
    /// Rolling cursors never bookmark past the `now` they were driven with, so
    /// repeated runs on the same day do not creep ahead of the clock.
    pub fn bookmark(&self) -> Timestamp {
        self.clamp(self.state.current_to_ts)
    }

    /// Bookmark covering `window` once its page has been consumed
    pub fn checkpoint(&self, window: &Window) -> Timestamp {
        self.clamp(window.to_ts)
    }

    fn clamp(&self, ts: Timestamp) -> Timestamp {
        match (self.anchor, self.horizon) {
            (WindowAnchor::Rolling, Some(horizon)) => ts.min(horizon),
            _ => ts,
        }
    }

    /// Whether extraction has caught up to the present
    pub fn is_overreached(&self) -> bool {
        self.state.overreach
    }
}

impl Paginator for WindowCursor {
    fn next_page(&mut self, now: DateTime<Utc>) -> Option<PageToken> {
        self.next_window(now).map(PageToken::Window)
    }

    fn advance(&mut self) {
        WindowCursor::advance(self);
    }

    fn bookmark(&self) -> Option<Timestamp> {
        Some(WindowCursor::bookmark(self))
    }

    fn checkpoint(&self, token: &PageToken) -> Option<Timestamp> {
        token.window().map(|w| WindowCursor::checkpoint(self, &w))
    }
}

// ============================================================================
// Date Helpers
// ============================================================================

/// Parse a `YYYY-MM-DD` start date
pub fn parse_start_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if !START_DATE_REGEX.is_match(s) {
        return Err(Error::invalid_value(
            "start_date",
            format!("'{s}' is not in YYYY-MM-DD format"),
        ));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::invalid_value("start_date", format!("'{s}': {e}")))
}

/// First second (UTC) of the given calendar month
pub fn month_start(year: i32, month: u32) -> Option<Timestamp> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// First second (UTC) of the calendar month containing `ts`
pub fn floor_to_month_start(ts: Timestamp) -> Timestamp {
    DateTime::from_timestamp(ts, 0)
        .and_then(|dt| month_start(dt.year(), dt.month()))
        .unwrap_or(ts)
}
