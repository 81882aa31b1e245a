//! Order Model
//!
//! One print job placed by a customer at a shop. Status moves monotonically
//! forward through `new → processing → ready → completed`; soft-deletion is an
//! orthogonal flag and never changes `status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Processing,
    Ready,
    Completed,
}

impl OrderStatus {
    /// The single legal next stage, or `None` for the terminal state.
    ///
    /// Transitions are exactly one step forward; there is no skipping and no
    /// going back.
    pub const fn next(&self) -> Option<OrderStatus> {
        match self {
            Self::New => Some(Self::Processing),
            Self::Processing => Some(Self::Ready),
            Self::Ready => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the job reaches the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Files uploaded ahead of time
    Upload,
    /// Placed at the counter
    Walkin,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    /// Public-facing short id (snowflake), optional for legacy rows
    pub public_id: Option<String>,
    /// Per-shop sequential number
    pub order_number: i64,
    pub customer_id: i64,
    pub shop_id: i64,
    pub order_type: OrderType,
    pub is_urgent: bool,
    pub title: String,
    pub description: Option<String>,
    pub status: OrderStatus,
    /// Soft-delete bookkeeping; a deleted order is hidden from default
    /// listings but remains addressable by id for audit.
    pub deleted_by: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub shop_id: i64,
    pub order_type: OrderType,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_urgent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_moves_one_step_forward() {
        assert_eq!(OrderStatus::New.next(), Some(OrderStatus::Processing));
        assert_eq!(OrderStatus::Processing.next(), Some(OrderStatus::Ready));
        assert_eq!(OrderStatus::Ready.next(), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::Completed.next(), None);
    }

    #[test]
    fn only_completed_is_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"ready\"").unwrap(),
            OrderStatus::Ready
        );
    }

    #[test]
    fn full_sequence_is_monotonic() {
        // Walking next() from New visits every stage exactly once
        let mut seen = vec![OrderStatus::New];
        while let Some(next) = seen.last().unwrap().next() {
            assert!(!seen.contains(&next), "status revisited: {next}");
            seen.push(next);
        }
        assert_eq!(
            seen,
            vec![
                OrderStatus::New,
                OrderStatus::Processing,
                OrderStatus::Ready,
                OrderStatus::Completed
            ]
        );
    }
}
