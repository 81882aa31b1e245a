//! Order lifecycle: create, advance, soft-delete, read

use shared::error::{AppError, ErrorCode};
use shared::models::{
    NotificationCreate, Order, OrderCreate, OrderStatus, OrderType, Shop, UserIdentity, UserRole,
};

use crate::error::ServiceResult;
use crate::live::{DomainEvent, EventDispatcher, OrderParties};
use crate::store::{DataStore, NewOrder};

fn parties(order: &Order, shop: &Shop) -> OrderParties {
    OrderParties {
        order_id: order.id,
        customer_id: order.customer_id,
        shop_owner_id: shop.owner_id,
    }
}

/// Load an order together with its shop, or fail with the right not-found code
async fn load_order_and_shop(store: &dyn DataStore, order_id: i64) -> ServiceResult<(Order, Shop)> {
    let order = store
        .load_order(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let shop = store
        .load_shop(order.shop_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ShopNotFound))?;
    Ok((order, shop))
}

fn is_party(actor: UserIdentity, order: &Order, shop: &Shop) -> bool {
    actor.is_admin()
        || (actor.role == UserRole::Customer && order.customer_id == actor.user_id)
        || (actor.role == UserRole::ShopOwner && shop.owner_id == actor.user_id)
}

/// Advance an order one step along `new → processing → ready → completed`
///
/// Only the owning shop (or an admin) may advance. The write is conditional on
/// the status the caller observed, so of two racing transitions exactly one
/// lands and the other gets a conflict.
pub async fn transition(
    store: &dyn DataStore,
    dispatcher: &EventDispatcher,
    actor: UserIdentity,
    order_id: i64,
    target: OrderStatus,
) -> ServiceResult<Order> {
    let (order, shop) = load_order_and_shop(store, order_id).await?;

    if !(actor.is_admin() || (actor.role == UserRole::ShopOwner && shop.owner_id == actor.user_id))
    {
        return Err(AppError::forbidden("Only the shop can advance an order").into());
    }
    if order.is_deleted() {
        return Err(AppError::new(ErrorCode::OrderDeleted).into());
    }

    let legal = order.status.next();
    if legal != Some(target) {
        return Err(AppError::invalid_transition(
            order.status.as_str(),
            legal.map(|s| s.as_str().to_string()),
        )
        .into());
    }

    if !store
        .update_order_status(order_id, order.status, target)
        .await?
    {
        // Lost the race: report against the status the row carries now
        return Err(stale_transition_error(store, order_id).await?.into());
    }

    // The write is committed: the status event (and its cleanup routing on
    // completion) must go out even if the notification row cannot be written.
    dispatcher
        .dispatch(DomainEvent::OrderStatusChanged {
            parties: parties(&order, &shop),
            old: order.status,
            new: target,
        })
        .await;

    match store
        .insert_notification(NotificationCreate {
            user_id: order.customer_id,
            title: "Order Status Updated".into(),
            message: format!("Order #{} is now {}", order.order_number, target),
            notification_type: "order_update".into(),
            related_id: Some(order.id),
        })
        .await
    {
        Ok(notification) => {
            dispatcher
                .dispatch(DomainEvent::NewNotification { notification })
                .await;
        }
        Err(e) => {
            tracing::warn!(order_id, error = ?e, "Failed to record status notification");
        }
    }

    tracing::info!(
        order_id,
        from = %order.status,
        to = %target,
        "Order status advanced"
    );

    Ok(Order {
        status: target,
        ..order
    })
}

/// Map a failed conditional status write to the error the fresh row deserves
async fn stale_transition_error(store: &dyn DataStore, order_id: i64) -> ServiceResult<AppError> {
    let fresh = store
        .load_order(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if fresh.is_deleted() {
        return Ok(AppError::new(ErrorCode::OrderDeleted));
    }
    Ok(AppError::invalid_transition(
        fresh.status.as_str(),
        fresh.status.next().map(|s| s.as_str().to_string()),
    ))
}

/// Soft-delete an order, returning the row with its deletion markers set
///
/// Either party (or an admin) may delete. Completed orders are immutable
/// history and cannot be deleted; deleting twice is a conflict.
pub async fn soft_delete(
    store: &dyn DataStore,
    dispatcher: &EventDispatcher,
    actor: UserIdentity,
    order_id: i64,
) -> ServiceResult<Order> {
    let (order, shop) = load_order_and_shop(store, order_id).await?;

    if !is_party(actor, &order, &shop) {
        return Err(AppError::forbidden("Not a party to this order").into());
    }
    if order.is_deleted() {
        return Err(AppError::new(ErrorCode::OrderDeleted).into());
    }
    if order.status == OrderStatus::Completed {
        return Err(AppError::new(ErrorCode::OrderAlreadyCompleted).into());
    }

    if !store.mark_order_deleted(order_id, actor.user_id).await? {
        // Raced with another delete or a completion
        let fresh = store
            .load_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        let code = if fresh.is_deleted() {
            ErrorCode::OrderDeleted
        } else {
            ErrorCode::OrderAlreadyCompleted
        };
        return Err(AppError::new(code).into());
    }

    // Reload so the caller sees the deletion markers the store just set
    let deleted = store
        .load_order(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    dispatcher
        .dispatch(DomainEvent::OrderDeleted {
            parties: parties(&order, &shop),
        })
        .await;

    tracing::info!(order_id, deleted_by = actor.user_id, "Order soft-deleted");
    Ok(deleted)
}

/// Place a new order at a shop
///
/// Gated by the shop's unified availability verdict: a closed, unapproved, or
/// deactivated shop never takes an order.
pub async fn create(
    store: &dyn DataStore,
    dispatcher: &EventDispatcher,
    actor: UserIdentity,
    payload: OrderCreate,
) -> ServiceResult<Order> {
    if actor.role != UserRole::Customer {
        return Err(AppError::forbidden("Only customers can place orders").into());
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::validation("Order title is required").into());
    }

    let shop = store
        .load_shop(payload.shop_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ShopNotFound))?;

    let verdict = shop.unified_status(super::local_now());
    if !verdict.can_accept_orders {
        let err = if !shop.is_approved {
            AppError::new(ErrorCode::ShopNotApproved)
        } else if shop.status != shared::models::ShopStatus::Active {
            AppError::new(ErrorCode::ShopDeactivated)
        } else {
            AppError::new(ErrorCode::ShopNotAccepting).with_detail("reason", verdict.reason)
        };
        return Err(err.into());
    }
    if payload.order_type == OrderType::Walkin && !shop.accepts_walkin_orders {
        return Err(AppError::with_message(
            ErrorCode::ShopNotAccepting,
            "Shop does not accept walk-in orders",
        )
        .into());
    }

    let order_number = store.next_order_number(shop.id).await?;
    let order = store
        .insert_order(NewOrder {
            public_id: format!("PE-{}", shared::util::snowflake_id()),
            order_number,
            customer_id: actor.user_id,
            shop_id: shop.id,
            order_type: payload.order_type,
            is_urgent: payload.is_urgent,
            title: payload.title,
            description: payload.description,
        })
        .await?;

    let notification = store
        .insert_notification(NotificationCreate {
            user_id: shop.owner_id,
            title: "New Order Received".into(),
            message: format!("Order #{}: {}", order.order_number, order.title),
            notification_type: "new_order".into(),
            related_id: Some(order.id),
        })
        .await?;
    dispatcher
        .dispatch(DomainEvent::NewNotification { notification })
        .await;

    tracing::info!(
        order_id = order.id,
        shop_id = shop.id,
        order_number,
        "Order created"
    );
    Ok(order)
}

/// Fetch one order
///
/// Soft-deleted orders stay addressable for admins (audit); parties get the
/// deleted conflict.
pub async fn get(
    store: &dyn DataStore,
    actor: UserIdentity,
    order_id: i64,
) -> ServiceResult<Order> {
    let (order, shop) = load_order_and_shop(store, order_id).await?;
    if !is_party(actor, &order, &shop) {
        return Err(AppError::forbidden("Not a party to this order").into());
    }
    if order.is_deleted() && !actor.is_admin() {
        return Err(AppError::new(ErrorCode::OrderDeleted).into());
    }
    Ok(order)
}

/// List the caller's own orders (deleted rows hidden unless admin)
pub async fn list_for_customer(
    store: &dyn DataStore,
    actor: UserIdentity,
) -> ServiceResult<Vec<Order>> {
    store
        .list_orders_for_customer(actor.user_id, actor.is_admin())
        .await
}

/// List a shop's orders — owner or admin only
pub async fn list_for_shop(
    store: &dyn DataStore,
    actor: UserIdentity,
    shop_id: i64,
) -> ServiceResult<Vec<Order>> {
    let shop = store
        .load_shop(shop_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ShopNotFound))?;
    if !(actor.is_admin() || (actor.role == UserRole::ShopOwner && shop.owner_id == actor.user_id))
    {
        return Err(AppError::forbidden("Not the owner of this shop").into());
    }
    store.list_orders_for_shop(shop_id, actor.is_admin()).await
}
