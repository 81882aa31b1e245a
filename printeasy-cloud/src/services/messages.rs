//! Order chat

use shared::error::{AppError, ErrorCode};
use shared::models::{Message, MessageCreate, NotificationCreate, UserIdentity, UserRole};

use crate::error::ServiceResult;
use crate::live::{DomainEvent, EventDispatcher, OrderParties};
use crate::store::{DataStore, NewMessage};

/// Post a chat message on an order
///
/// Sender must be a party to the order (or an admin). Delivery targets the
/// other parties, never the sender; an admin message reaches both.
pub async fn post(
    store: &dyn DataStore,
    dispatcher: &EventDispatcher,
    actor: UserIdentity,
    order_id: i64,
    payload: MessageCreate,
) -> ServiceResult<Message> {
    let order = store
        .load_order(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    if order.is_deleted() {
        return Err(AppError::new(ErrorCode::OrderDeleted).into());
    }
    let shop = store
        .load_shop(order.shop_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ShopNotFound))?;

    let is_party = actor.is_admin()
        || (actor.role == UserRole::Customer && order.customer_id == actor.user_id)
        || (actor.role == UserRole::ShopOwner && shop.owner_id == actor.user_id);
    if !is_party {
        return Err(AppError::forbidden("Not a party to this order").into());
    }

    if payload.content.trim().is_empty() && payload.files.is_empty() {
        return Err(AppError::validation("Message needs content or files").into());
    }

    let message = store
        .insert_message(NewMessage {
            order_id,
            sender_id: actor.user_id,
            sender_role: actor.role,
            content: payload.content,
            files: payload.files,
        })
        .await?;

    // Durable notification per recipient; live push follows
    for recipient in [order.customer_id, shop.owner_id] {
        if recipient == actor.user_id {
            continue;
        }
        let notification = store
            .insert_notification(NotificationCreate {
                user_id: recipient,
                title: "New Message".into(),
                message: format!("New message on order #{}", order.order_number),
                notification_type: "new_message".into(),
                related_id: Some(order.id),
            })
            .await?;
        dispatcher
            .dispatch(DomainEvent::NewNotification { notification })
            .await;
    }

    dispatcher
        .dispatch(DomainEvent::MessagePosted {
            parties: OrderParties {
                order_id,
                customer_id: order.customer_id,
                shop_owner_id: shop.owner_id,
            },
            message: message.clone(),
        })
        .await;

    Ok(message)
}

/// Read an order's chat history — parties and admins only
pub async fn list(
    store: &dyn DataStore,
    actor: UserIdentity,
    order_id: i64,
) -> ServiceResult<Vec<Message>> {
    let order = store
        .load_order(order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    let shop = store
        .load_shop(order.shop_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ShopNotFound))?;

    let is_party = actor.is_admin()
        || (actor.role == UserRole::Customer && order.customer_id == actor.user_id)
        || (actor.role == UserRole::ShopOwner && shop.owner_id == actor.user_id);
    if !is_party {
        return Err(AppError::forbidden("Not a party to this order").into());
    }
    if order.is_deleted() && !actor.is_admin() {
        return Err(AppError::new(ErrorCode::OrderDeleted).into());
    }

    store.list_messages(order_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::SessionRegistry;
    use crate::store::memory::{MemoryStore, test_order, test_shop};
    use shared::live::LiveEvent;
    use shared::models::OrderStatus;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    const CUSTOMER: UserIdentity = UserIdentity {
        user_id: 1,
        role: UserRole::Customer,
    };
    const OWNER: UserIdentity = UserIdentity {
        user_id: 2,
        role: UserRole::ShopOwner,
    };

    fn ctx() -> (Arc<MemoryStore>, Arc<SessionRegistry>, EventDispatcher) {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(SessionRegistry::new());
        let (cleanup_tx, _cleanup_rx) = mpsc::channel(8);
        store.seed_shop(test_shop(10, OWNER.user_id));
        store.seed_order(test_order(42, CUSTOMER.user_id, 10, OrderStatus::Processing));
        let dispatcher = EventDispatcher::new(registry.clone(), cleanup_tx);
        (store, registry, dispatcher)
    }

    fn payload(content: &str) -> MessageCreate {
        MessageCreate {
            content: content.into(),
            files: vec![],
        }
    }

    #[tokio::test]
    async fn message_goes_to_the_other_party_only() {
        let (store, registry, dispatcher) = ctx();
        let (_s1, mut customer_rx) = registry.register(CUSTOMER.user_id, UserRole::Customer);
        let (_s2, mut owner_rx) = registry.register(OWNER.user_id, UserRole::ShopOwner);

        let message = post(store.as_ref(), &dispatcher, CUSTOMER, 42, payload("Is it ready?"))
            .await
            .unwrap();
        assert_eq!(message.sender_id, CUSTOMER.user_id);

        // Owner: durable notification push plus the chat event
        let mut saw_chat = false;
        while let Ok(event) = owner_rx.try_recv() {
            if let LiveEvent::NewMessage { order_id, message } = event {
                assert_eq!(order_id, 42);
                assert_eq!(message.content, "Is it ready?");
                saw_chat = true;
            }
        }
        assert!(saw_chat);
        assert!(customer_rx.try_recv().is_err(), "sender must not be echoed");

        // Durable row targets the owner
        let notes = store.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_id, OWNER.user_id);
        assert_eq!(notes[0].notification_type, "new_message");
    }

    #[tokio::test]
    async fn outsider_cannot_post_or_read() {
        let (store, _registry, dispatcher) = ctx();
        let outsider = UserIdentity::new(99, UserRole::Customer);

        let err = post(store.as_ref(), &dispatcher, outsider, 42, payload("hi"))
            .await
            .unwrap_err();
        match err {
            crate::error::ServiceError::App(e) => {
                assert_eq!(e.code, ErrorCode::PermissionDenied)
            }
            other => panic!("Expected App error, got {other:?}"),
        }
        assert!(list(store.as_ref(), outsider, 42).await.is_err());
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let (store, _registry, dispatcher) = ctx();
        let err = post(store.as_ref(), &dispatcher, CUSTOMER, 42, payload("   "))
            .await
            .unwrap_err();
        match err {
            crate::error::ServiceError::App(e) => {
                assert_eq!(e.code, ErrorCode::ValidationFailed)
            }
            other => panic!("Expected App error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_on_deleted_order_conflicts() {
        let (store, _registry, dispatcher) = ctx();
        store.mark_order_deleted(42, CUSTOMER.user_id).await.unwrap();

        let err = post(store.as_ref(), &dispatcher, OWNER, 42, payload("hello?"))
            .await
            .unwrap_err();
        match err {
            crate::error::ServiceError::App(e) => assert_eq!(e.code, ErrorCode::OrderDeleted),
            other => panic!("Expected App error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn history_is_ordered_and_party_visible() {
        let (store, _registry, dispatcher) = ctx();
        post(store.as_ref(), &dispatcher, CUSTOMER, 42, payload("first"))
            .await
            .unwrap();
        post(store.as_ref(), &dispatcher, OWNER, 42, payload("second"))
            .await
            .unwrap();

        let history = list(store.as_ref(), OWNER, 42).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "second");
    }
}
