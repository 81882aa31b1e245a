//! Shop availability resolver
//!
//! Pure derivation of a shop's open/closed verdict from its weekly schedule
//! plus the manual override. Deterministic given its inputs, no side effects,
//! and it never fails: malformed or missing schedule data degrades to closed
//! with a "Schedule unavailable" reason rather than erroring — a page must
//! still render (as closed) on bad data.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::models::shop::{DaySchedule, WeeklySchedule};

/// Unified open/closed verdict, recomputed on demand and never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedStatus {
    pub is_open: bool,
    /// `is_open` here; callers apply the external approval gate on top
    pub can_accept_orders: bool,
    pub status_text: StatusText,
    pub reason: String,
}

/// Display status for storefront badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusText {
    Open,
    Closed,
}

impl UnifiedStatus {
    fn open(reason: String) -> Self {
        Self {
            is_open: true,
            can_accept_orders: true,
            status_text: StatusText::Open,
            reason,
        }
    }

    fn closed(reason: impl Into<String>) -> Self {
        Self {
            is_open: false,
            can_accept_orders: false,
            status_text: StatusText::Closed,
            reason: reason.into(),
        }
    }
}

const REASON_MANUAL_OPEN: &str = "Manually opened";
const REASON_MANUAL_CLOSED: &str = "Manually closed";
const REASON_CLOSED_TODAY: &str = "Closed today per schedule";
const REASON_UNAVAILABLE: &str = "Schedule unavailable";
const REASON_OPEN_24H: &str = "Open 24 hours";

/// Resolve the unified status for a shop at `now` (local clock).
///
/// - `auto_availability == false`: the manual `is_online` toggle is
///   authoritative and the schedule is ignored entirely.
/// - `auto_availability == true`: today's schedule entry decides. The open
///   interval is half-open `[open, close)`; `close <= open` wraps past
///   midnight (e.g. 22:00–02:00).
pub fn resolve_status(
    schedule: &WeeklySchedule,
    auto_availability: bool,
    is_online: bool,
    now: NaiveDateTime,
) -> UnifiedStatus {
    if !auto_availability {
        return if is_online {
            UnifiedStatus::open(REASON_MANUAL_OPEN.to_string())
        } else {
            UnifiedStatus::closed(REASON_MANUAL_CLOSED)
        };
    }

    let Some(today) = schedule.for_weekday(now.weekday()) else {
        // Missing entry defaults to closed, never silently open
        return UnifiedStatus::closed(REASON_UNAVAILABLE);
    };

    resolve_day(today, now)
}

fn resolve_day(today: &DaySchedule, now: NaiveDateTime) -> UnifiedStatus {
    if today.closed {
        return UnifiedStatus::closed(REASON_CLOSED_TODAY);
    }

    if today.is_24_hours {
        return UnifiedStatus::open(REASON_OPEN_24H.to_string());
    }

    let (Some(open), Some(close)) = (parse_hhmm(&today.open), parse_hhmm(&today.close)) else {
        return UnifiedStatus::closed(REASON_UNAVAILABLE);
    };

    // open == close behaves as a full wrap, i.e. open all day
    if open == close {
        return UnifiedStatus::open(REASON_OPEN_24H.to_string());
    }

    let minute = now.hour() * 60 + now.minute();
    let is_open = if close > open {
        minute >= open && minute < close
    } else {
        // Overnight interval wrapping past midnight
        minute >= open || minute < close
    };

    if is_open {
        UnifiedStatus::open(format!("Open until {}", format_hhmm(close)))
    } else {
        UnifiedStatus::closed(format!("Opens at {}", format_hhmm(open)))
    }
}

/// Parse "HH:MM" into minutes since midnight; `None` on any malformed input
fn parse_hhmm(value: &str) -> Option<u32> {
    let (hh, mm) = value.trim().split_once(':')?;
    let hours: u32 = hh.parse().ok()?;
    let minutes: u32 = mm.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
