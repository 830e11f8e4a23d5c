//! Timewindows
//!
//! A timewindow describes the range of time a widget's data should
//! reflect: either a fixed historical interval or a rolling duration
//! ending "now". Rolling windows are resolved to concrete bounds at the
//! moment of each fetch, never cached.

use serde::{Deserialize, Serialize};

/// Fallback window length when a timewindow carries no usable duration
pub const DEFAULT_TIMEWINDOW_MS: i64 = 3_600_000;

/// Concrete, resolved time bounds in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ts: i64,
    pub end_ts: i64,
}

impl TimeRange {
    pub fn span_ms(&self) -> i64 {
        self.end_ts - self.start_ts
    }
}

/// Rolling window ending at resolution time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timewindow_ms: Option<i64>,
}

/// Fixed historical interval, used verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FixedWindow {
    pub start_time_ms: i64,
    pub end_time_ms: i64,
}

/// History section: either a fixed interval or a rolling look-back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoryWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timewindow_ms: Option<i64>,

    #[serde(
        rename = "fixedTimewindow",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed: Option<FixedWindow>,
}

/// The time range a widget's data should reflect
///
/// Exactly one of the two sections is expected to be active; resolution
/// precedence when both are present follows the persisted documents in
/// the wild: a fixed history interval wins, then the realtime duration,
/// then the history duration, then [`DEFAULT_TIMEWINDOW_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Timewindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime: Option<RealtimeWindow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryWindow>,
}

impl Timewindow {
    /// Rolling realtime window of the given duration
    pub fn realtime_ms(timewindow_ms: i64) -> Self {
        Self {
            realtime: Some(RealtimeWindow {
                timewindow_ms: Some(timewindow_ms),
            }),
            history: None,
        }
    }

    /// Fixed historical window
    pub fn fixed(start_time_ms: i64, end_time_ms: i64) -> Self {
        Self {
            realtime: None,
            history: Some(HistoryWindow {
                timewindow_ms: None,
                fixed: Some(FixedWindow {
                    start_time_ms,
                    end_time_ms,
                }),
            }),
        }
    }

    /// Resolve to concrete bounds, with `now` in epoch milliseconds
    pub fn resolve(&self, now_ms: i64) -> TimeRange {
        if let Some(fixed) = self.history.as_ref().and_then(|h| h.fixed.as_ref()) {
            return TimeRange {
                start_ts: fixed.start_time_ms,
                end_ts: fixed.end_time_ms,
            };
        }

        let duration = self
            .realtime
            .as_ref()
            .and_then(|r| r.timewindow_ms)
            .or_else(|| self.history.as_ref().and_then(|h| h.timewindow_ms))
            .unwrap_or(DEFAULT_TIMEWINDOW_MS);

        TimeRange {
            start_ts: now_ms - duration,
            end_ts: now_ms,
        }
    }

    /// Rolling duration for streaming subscriptions, if any
    pub fn rolling_ms(&self) -> Option<i64> {
        self.realtime
            .as_ref()
            .and_then(|r| r.timewindow_ms)
            .or_else(|| self.history.as_ref().and_then(|h| h.timewindow_ms))
    }
}

/// Resolve an optional timewindow, defaulting to the standard look-back
pub fn resolve_or_default(timewindow: Option<&Timewindow>, now_ms: i64) -> TimeRange {
    timewindow
        .copied()
        .unwrap_or_default()
        .resolve(now_ms)
}
