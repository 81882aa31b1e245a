//! In-memory store for service-layer tests
//!
//! Mirrors the conditional-write semantics of the PostgreSQL store exactly;
//! guard mismatches return false just like a zero-row UPDATE.

use async_trait::async_trait;
use chrono::Utc;
use shared::models::{
    DaySchedule, FileRef, Message, Notification, NotificationCreate, Order, OrderStatus,
    OrderType, Shop, ShopStatus, WeeklySchedule,
};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{DataStore, NewMessage, NewOrder};
use crate::error::ServiceResult;

#[derive(Default)]
pub struct MemoryStore {
    orders: Mutex<BTreeMap<i64, Order>>,
    shops: Mutex<BTreeMap<i64, Shop>>,
    messages: Mutex<Vec<Message>>,
    notifications: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            ..Self::default()
        }
    }

    fn fresh_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn seed_shop(&self, shop: Shop) {
        self.shops.lock().unwrap().insert(shop.id, shop);
    }

    pub fn seed_order(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    /// Notification rows written so far (assertion helper)
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn load_order(&self, id: i64) -> ServiceResult<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> ServiceResult<bool> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(&id) {
            Some(order) if order.status == from && !order.is_deleted() => {
                order.status = to;
                order.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_order_deleted(&self, id: i64, deleted_by: i64) -> ServiceResult<bool> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(&id) {
            Some(order) if !order.is_deleted() && order.status != OrderStatus::Completed => {
                order.deleted_by = Some(deleted_by);
                order.deleted_at = Some(Utc::now());
                order.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn next_order_number(&self, shop_id: i64) -> ServiceResult<i64> {
        let mut shops = self.shops.lock().unwrap();
        match shops.get_mut(&shop_id) {
            Some(shop) => {
                shop.total_orders += 1;
                Ok(shop.total_orders)
            }
            None => Err(shared::error::AppError::new(
                shared::error::ErrorCode::ShopNotFound,
            )
            .into()),
        }
    }

    async fn insert_order(&self, new: NewOrder) -> ServiceResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: self.fresh_id(),
            public_id: Some(new.public_id),
            order_number: new.order_number,
            customer_id: new.customer_id,
            shop_id: new.shop_id,
            order_type: new.order_type,
            is_urgent: new.is_urgent,
            title: new.title,
            description: new.description,
            status: OrderStatus::New,
            deleted_by: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().unwrap().insert(order.id, order.clone());
        Ok(order)
    }

    async fn list_orders_for_customer(
        &self,
        customer_id: i64,
        include_deleted: bool,
    ) -> ServiceResult<Vec<Order>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.customer_id == customer_id && (include_deleted || !o.is_deleted()))
            .cloned()
            .collect())
    }

    async fn list_orders_for_shop(
        &self,
        shop_id: i64,
        include_deleted: bool,
    ) -> ServiceResult<Vec<Order>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.shop_id == shop_id && (include_deleted || !o.is_deleted()))
            .cloned()
            .collect())
    }

    async fn load_shop(&self, id: i64) -> ServiceResult<Option<Shop>> {
        Ok(self.shops.lock().unwrap().get(&id).cloned())
    }

    async fn set_shop_online(&self, shop_id: i64, is_online: bool) -> ServiceResult<Option<Shop>> {
        let mut shops = self.shops.lock().unwrap();
        Ok(shops.get_mut(&shop_id).map(|shop| {
            shop.is_online = is_online;
            shop.updated_at = Utc::now();
            shop.clone()
        }))
    }

    async fn insert_message(&self, new: NewMessage) -> ServiceResult<Message> {
        let message = Message {
            id: self.fresh_id(),
            order_id: new.order_id,
            sender_id: new.sender_id,
            sender_role: new.sender_role,
            content: new.content,
            files: new.files,
            created_at: Utc::now(),
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, order_id: i64) -> ServiceResult<Vec<Message>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn insert_notification(&self, new: NotificationCreate) -> ServiceResult<Notification> {
        let notification = Notification {
            id: self.fresh_id(),
            user_id: new.user_id,
            title: new.title,
            message: new.message,
            notification_type: new.notification_type,
            related_id: new.related_id,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications
            .lock()
            .unwrap()
            .push(notification.clone());
        Ok(notification)
    }

    async fn take_order_files(&self, order_id: i64) -> ServiceResult<Vec<FileRef>> {
        let mut messages = self.messages.lock().unwrap();
        let mut taken = Vec::new();
        for message in messages.iter_mut().filter(|m| m.order_id == order_id) {
            taken.append(&mut message.files);
        }
        Ok(taken)
    }
}

/// Approved, active shop in manual mode, currently online
pub fn test_shop(id: i64, owner_id: i64) -> Shop {
    let mut hours = WeeklySchedule::default();
    for weekday in [
        chrono::Weekday::Mon,
        chrono::Weekday::Tue,
        chrono::Weekday::Wed,
        chrono::Weekday::Thu,
        chrono::Weekday::Fri,
    ] {
        hours.set(
            weekday,
            DaySchedule {
                open: "09:00".into(),
                close: "18:00".into(),
                closed: false,
                is_24_hours: false,
            },
        );
    }
    Shop {
        id,
        owner_id,
        name: format!("Shop {id}"),
        slug: format!("shop-{id}"),
        working_hours: hours,
        is_online: true,
        auto_availability: false,
        accepts_walkin_orders: true,
        is_approved: true,
        status: ShopStatus::Active,
        total_orders: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_order(id: i64, customer_id: i64, shop_id: i64, status: OrderStatus) -> Order {
    Order {
        id,
        public_id: Some(format!("PE-{id}")),
        order_number: id,
        customer_id,
        shop_id,
        order_type: OrderType::Upload,
        is_urgent: false,
        title: "Business cards".into(),
        description: None,
        status,
        deleted_by: None,
        deleted_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
