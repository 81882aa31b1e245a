//! Live wire-event payloads
//!
//! The closed set of events pushed to connected clients over WebSocket. Each
//! variant carries only the ids and changed fields — never the full entity.
//! The tag spellings (`order_update`, `new_message`, `newNotification`,
//! `shop_status_change`) are part of the wire contract with existing clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::UnifiedStatus;
use crate::models::{Message, Notification, OrderStatus, UserRole};

/// Order status as it appears on the wire
///
/// Soft-deletion is orthogonal to the stored status but is surfaced to
/// clients as a `deleted` status on the same event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireOrderStatus {
    New,
    Processing,
    Ready,
    Completed,
    Deleted,
}

impl From<OrderStatus> for WireOrderStatus {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::New => Self::New,
            OrderStatus::Processing => Self::Processing,
            OrderStatus::Ready => Self::Ready,
            OrderStatus::Completed => Self::Completed,
        }
    }
}

/// Minimal chat-message fields pushed with a `new_message` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePreview {
    pub id: i64,
    pub sender_id: i64,
    pub sender_role: UserRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessagePreview {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            sender_role: message.sender_role,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// One event on the live wire (server -> client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LiveEvent {
    /// Connection acknowledged after authentication
    #[serde(rename = "connected", rename_all = "camelCase")]
    Connected { user_id: i64 },

    /// An order's status changed (or the order was soft-deleted)
    #[serde(rename = "order_update", rename_all = "camelCase")]
    OrderUpdate {
        order_id: i64,
        status: WireOrderStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_status: Option<WireOrderStatus>,
    },

    /// A chat message was posted on one of the recipient's orders
    #[serde(rename = "new_message", rename_all = "camelCase")]
    NewMessage { order_id: i64, message: MessagePreview },

    /// A durable notification row was created for the recipient
    // Tag spelling kept from the legacy wire format
    #[serde(rename = "newNotification")]
    NewNotification { notification: Notification },

    /// A shop's unified status flipped
    #[serde(rename = "shop_status_change", rename_all = "camelCase")]
    ShopStatusChange { shop_id: i64, status: UnifiedStatus },
}

impl LiveEvent {
    pub fn order_update(order_id: i64, old: OrderStatus, new: OrderStatus) -> Self {
        Self::OrderUpdate {
            order_id,
            status: new.into(),
            previous_status: Some(old.into()),
        }
    }

    pub fn order_deleted(order_id: i64) -> Self {
        Self::OrderUpdate {
            order_id,
            status: WireOrderStatus::Deleted,
            previous_status: None,
        }
    }

    pub fn new_message(message: &Message) -> Self {
        Self::NewMessage {
            order_id: message.order_id,
            message: message.into(),
        }
    }
}
