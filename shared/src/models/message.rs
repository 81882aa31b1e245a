//! Message Model
//!
//! One chat entry attached to an order. Per-recipient read tracking lives in
//! the external persistence collaborator, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// Reference to an uploaded file attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
}

/// Chat message entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub order_id: i64,
    pub sender_id: i64,
    pub sender_role: UserRole,
    pub content: String,
    /// Attached files (stored as JSON)
    #[cfg_attr(feature = "db", sqlx(json))]
    pub files: Vec<FileRef>,
    pub created_at: DateTime<Utc>,
}

/// Post message payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreate {
    pub content: String,
    #[serde(default)]
    pub files: Vec<FileRef>,
}
