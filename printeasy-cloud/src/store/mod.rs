//! Persistence seam
//!
//! Services talk to a [`DataStore`] trait object instead of the pool directly,
//! so business rules are testable against the in-memory store while production
//! runs on PostgreSQL. Every conditional write (status advance, soft delete)
//! reports whether its guard matched, which is how concurrent updates lose
//! cleanly instead of clobbering each other.

mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

use async_trait::async_trait;
use shared::models::{
    FileRef, Message, Notification, NotificationCreate, Order, OrderStatus, OrderType, Shop,
    UserRole,
};

use crate::error::ServiceResult;

/// Fully resolved order row waiting to be inserted
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub public_id: String,
    pub order_number: i64,
    pub customer_id: i64,
    pub shop_id: i64,
    pub order_type: OrderType,
    pub is_urgent: bool,
    pub title: String,
    pub description: Option<String>,
}

/// Fully resolved message row waiting to be inserted
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub order_id: i64,
    pub sender_id: i64,
    pub sender_role: UserRole,
    pub content: String,
    pub files: Vec<FileRef>,
}

/// Storage operations the service layer depends on
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Load an order by id, soft-deleted rows included (callers decide
    /// whether a deleted row is addressable)
    async fn load_order(&self, id: i64) -> ServiceResult<Option<Order>>;

    /// Conditionally advance an order's status
    ///
    /// The write only lands when the row still carries `from` and is not
    /// soft-deleted; returns whether it did. Two racing transitions can both
    /// pass the service-layer check, but only one guard matches here.
    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> ServiceResult<bool>;

    /// Conditionally soft-delete an order (not already deleted, not completed)
    async fn mark_order_deleted(&self, id: i64, deleted_by: i64) -> ServiceResult<bool>;

    /// Atomically bump the shop's lifetime order counter and return the new
    /// value, which doubles as the per-shop order number
    async fn next_order_number(&self, shop_id: i64) -> ServiceResult<i64>;

    async fn insert_order(&self, new: NewOrder) -> ServiceResult<Order>;

    async fn list_orders_for_customer(
        &self,
        customer_id: i64,
        include_deleted: bool,
    ) -> ServiceResult<Vec<Order>>;

    async fn list_orders_for_shop(
        &self,
        shop_id: i64,
        include_deleted: bool,
    ) -> ServiceResult<Vec<Order>>;

    async fn load_shop(&self, id: i64) -> ServiceResult<Option<Shop>>;

    /// Flip the manual availability switch, returning the updated row
    async fn set_shop_online(&self, shop_id: i64, is_online: bool) -> ServiceResult<Option<Shop>>;

    async fn insert_message(&self, new: NewMessage) -> ServiceResult<Message>;

    async fn list_messages(&self, order_id: i64) -> ServiceResult<Vec<Message>>;

    async fn insert_notification(&self, new: NotificationCreate) -> ServiceResult<Notification>;

    /// Detach and return every file attached to an order's messages
    ///
    /// Called by the cleanup worker after completion; the returned refs are
    /// what still needs removing from disk.
    async fn take_order_files(&self, order_id: i64) -> ServiceResult<Vec<FileRef>>;
}
