//! Shop Model
//!
//! A print shop storefront. Open/closed is never stored; it is derived on
//! demand by the availability resolver from the weekly schedule plus the
//! manual override.

use chrono::{DateTime, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::availability::{self, UnifiedStatus};

/// Admin-controlled shop lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ShopStatus {
    Active,
    Deactivated,
    Banned,
}

/// One weekday's schedule entry
///
/// Times are "HH:MM" on a 24-hour local clock. `close <= open` means the
/// interval wraps past midnight (e.g. 22:00–02:00).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub closed: bool,
    /// Explicit 24/7 flag
    #[serde(default, rename = "is24Hours")]
    pub is_24_hours: bool,
}

/// Weekly working hours, keyed by lowercase weekday name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule(pub HashMap<String, DaySchedule>);

impl WeeklySchedule {
    /// Look up the entry for a weekday; `None` means the day is treated as
    /// closed (fail safe, never silently open).
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DaySchedule> {
        self.0.get(weekday_key(weekday))
    }

    pub fn set(&mut self, weekday: Weekday, entry: DaySchedule) {
        self.0.insert(weekday_key(weekday).to_string(), entry);
    }
}

/// Lowercase weekday name used as schedule key (matches the stored JSON)
pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Shop entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub slug: String,
    /// Weekly working hours (stored as JSON)
    #[cfg_attr(feature = "db", sqlx(json))]
    pub working_hours: WeeklySchedule,
    /// Manual owner-controlled override; authoritative when
    /// `auto_availability` is false
    pub is_online: bool,
    /// Derive open/closed purely from the schedule when true
    pub auto_availability: bool,
    pub accepts_walkin_orders: bool,
    pub is_approved: bool,
    pub status: ShopStatus,
    /// Lifetime order count; doubles as the per-shop order-number sequence
    pub total_orders: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shop {
    /// Fresh unified verdict with the external approval gate applied:
    /// `can_accept_orders` additionally requires an approved, active shop.
    pub fn unified_status(&self, now: NaiveDateTime) -> UnifiedStatus {
        let mut status = availability::resolve_status(
            &self.working_hours,
            self.auto_availability,
            self.is_online,
            now,
        );
        status.can_accept_orders =
            status.can_accept_orders && self.is_approved && self.status == ShopStatus::Active;
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn shop(is_approved: bool, status: ShopStatus) -> Shop {
        let mut hours = WeeklySchedule::default();
        hours.set(
            Weekday::Mon,
            DaySchedule {
                open: "09:00".into(),
                close: "18:00".into(),
                closed: false,
                is_24_hours: false,
            },
        );
        Shop {
            id: 1,
            owner_id: 10,
            name: "Quick Prints".into(),
            slug: "quick-prints".into(),
            working_hours: hours,
            is_online: true,
            auto_availability: true,
            accepts_walkin_orders: true,
            is_approved,
            status,
            total_orders: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn monday_10am() -> NaiveDateTime {
        // 2024-01-01 is a Monday
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn approval_gates_can_accept_orders() {
        let open = shop(true, ShopStatus::Active).unified_status(monday_10am());
        assert!(open.is_open);
        assert!(open.can_accept_orders);

        let unapproved = shop(false, ShopStatus::Active).unified_status(monday_10am());
        assert!(unapproved.is_open);
        assert!(!unapproved.can_accept_orders);

        let banned = shop(true, ShopStatus::Banned).unified_status(monday_10am());
        assert!(banned.is_open);
        assert!(!banned.can_accept_orders);
    }

    #[test]
    fn schedule_roundtrips_through_json() {
        let hours = shop(true, ShopStatus::Active).working_hours;
        let json = serde_json::to_string(&hours).unwrap();
        assert!(json.contains("\"monday\""));
        let back: WeeklySchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hours);
    }
}
