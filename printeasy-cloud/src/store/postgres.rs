//! PostgreSQL-backed store

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    FileRef, Message, Notification, NotificationCreate, Order, OrderStatus, Shop,
};
use sqlx::PgPool;

use super::{DataStore, NewMessage, NewOrder};
use crate::error::ServiceResult;

const ORDER_COLUMNS: &str = "id, public_id, order_number, customer_id, shop_id, order_type, \
     is_urgent, title, description, status, deleted_by, deleted_at, created_at, updated_at";

const SHOP_COLUMNS: &str = "id, owner_id, name, slug, working_hours, is_online, \
     auto_availability, accepts_walkin_orders, is_approved, status, total_orders, \
     created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, order_id, sender_id, sender_role, content, files, created_at";

/// Production store over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn load_order(&self, id: i64) -> ServiceResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_order_deleted(&self, id: i64, deleted_by: i64) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET deleted_by = $2, deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL AND status <> $3",
        )
        .bind(id)
        .bind(deleted_by)
        .bind(OrderStatus::Completed)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn next_order_number(&self, shop_id: i64) -> ServiceResult<i64> {
        let number: Option<i64> = sqlx::query_scalar(
            "UPDATE shops SET total_orders = total_orders + 1, updated_at = NOW() \
             WHERE id = $1 RETURNING total_orders",
        )
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;
        number.ok_or_else(|| AppError::new(ErrorCode::ShopNotFound).into())
    }

    async fn insert_order(&self, new: NewOrder) -> ServiceResult<Order> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders \
             (public_id, order_number, customer_id, shop_id, order_type, is_urgent, title, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&new.public_id)
        .bind(new.order_number)
        .bind(new.customer_id)
        .bind(new.shop_id)
        .bind(new.order_type)
        .bind(new.is_urgent)
        .bind(&new.title)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(order)
    }

    async fn list_orders_for_customer(
        &self,
        customer_id: i64,
        include_deleted: bool,
    ) -> ServiceResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE customer_id = $1 AND ($2 OR deleted_at IS NULL) \
             ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn list_orders_for_shop(
        &self,
        shop_id: i64,
        include_deleted: bool,
    ) -> ServiceResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE shop_id = $1 AND ($2 OR deleted_at IS NULL) \
             ORDER BY created_at DESC"
        ))
        .bind(shop_id)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn load_shop(&self, id: i64) -> ServiceResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(shop)
    }

    async fn set_shop_online(&self, shop_id: i64, is_online: bool) -> ServiceResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>(&format!(
            "UPDATE shops SET is_online = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {SHOP_COLUMNS}"
        ))
        .bind(shop_id)
        .bind(is_online)
        .fetch_optional(&self.pool)
        .await?;
        Ok(shop)
    }

    async fn insert_message(&self, new: NewMessage) -> ServiceResult<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (order_id, sender_id, sender_role, content, files) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(new.order_id)
        .bind(new.sender_id)
        .bind(new.sender_role)
        .bind(&new.content)
        .bind(sqlx::types::Json(&new.files))
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn list_messages(&self, order_id: i64) -> ServiceResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE order_id = $1 ORDER BY created_at ASC"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn insert_notification(&self, new: NotificationCreate) -> ServiceResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, title, message, notification_type, related_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, title, message, notification_type, related_id, is_read, created_at",
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.notification_type)
        .bind(new.related_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn take_order_files(&self, order_id: i64) -> ServiceResult<Vec<FileRef>> {
        // RETURNING sees post-update values, so the pre-update files come
        // from the locked subquery
        let rows: Vec<(sqlx::types::Json<Vec<FileRef>>,)> = sqlx::query_as(
            "UPDATE messages m SET files = '[]'::jsonb \
             FROM (SELECT id, files FROM messages WHERE order_id = $1 FOR UPDATE) prev \
             WHERE m.id = prev.id AND jsonb_array_length(prev.files) > 0 \
             RETURNING prev.files",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().flat_map(|(files,)| files.0).collect())
    }
}
