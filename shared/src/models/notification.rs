//! Notification Model
//!
//! Durable per-user notification row. This is the offline-delivery path; the
//! live socket push is best-effort and independent of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    /// Free-form type tag (e.g. "order_update")
    pub notification_type: String,
    /// Related entity id (order, shop) when applicable
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Create notification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationCreate {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub related_id: Option<i64>,
}
