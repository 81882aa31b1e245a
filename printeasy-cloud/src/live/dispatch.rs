//! Event dispatcher — the single ingress for domain events
//!
//! Mutation code calls [`EventDispatcher::dispatch`] after its persistence
//! write commits, never before. The dispatcher resolves the interested
//! parties for the event type, builds the minimal wire payload, and hands
//! delivery to the fan-out. It holds no socket state of its own.
//!
//! ```text
//! services (post-commit)
//!       │ DomainEvent
//!       ▼
//! EventDispatcher
//!   ├── fan-out ──► per-session channels            [best-effort]
//!   └── mpsc    ──► file-cleanup worker (Completed) [critical, blocking send]
//! ```

use chrono::NaiveDateTime;
use shared::live::LiveEvent;
use shared::models::{Message, Notification, OrderStatus, Shop, UserRole};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{Fanout, SessionId, SessionRegistry};
use crate::cleanup::CleanupJob;

/// The parties on one order, resolved by the service layer before dispatch
#[derive(Debug, Clone, Copy)]
pub struct OrderParties {
    pub order_id: i64,
    pub customer_id: i64,
    pub shop_owner_id: i64,
}

/// A domain event emitted by mutation code after its write committed
#[derive(Debug)]
pub enum DomainEvent {
    OrderStatusChanged {
        parties: OrderParties,
        old: OrderStatus,
        new: OrderStatus,
    },
    OrderDeleted {
        parties: OrderParties,
    },
    MessagePosted {
        parties: OrderParties,
        message: Message,
    },
    /// Carries the freshly persisted shop row; the dispatcher recomputes the
    /// unified verdict so subscribers never see a stale one
    ShopStatusToggled {
        shop: Shop,
        now: NaiveDateTime,
    },
    NewNotification {
        notification: Notification,
    },
}

/// Routes domain events to the right recipients
#[derive(Debug)]
pub struct EventDispatcher {
    fanout: Fanout,
    cleanup_tx: mpsc::Sender<CleanupJob>,
}

impl EventDispatcher {
    pub fn new(registry: Arc<SessionRegistry>, cleanup_tx: mpsc::Sender<CleanupJob>) -> Self {
        Self {
            fanout: Fanout::new(registry),
            cleanup_tx,
        }
    }

    pub fn fanout(&self) -> &Fanout {
        &self.fanout
    }

    fn registry(&self) -> &Arc<SessionRegistry> {
        self.fanout.registry()
    }

    /// Dispatch one event to its interested parties
    pub async fn dispatch(&self, event: DomainEvent) {
        match event {
            DomainEvent::OrderStatusChanged { parties, old, new } => {
                let wire = LiveEvent::order_update(parties.order_id, old, new);
                self.fanout
                    .deliver_to_users(&[parties.customer_id, parties.shop_owner_id], &wire);

                // Reaching the terminal status triggers downstream file
                // cleanup. That path is critical, so a full queue blocks here
                // instead of dropping.
                if new == OrderStatus::Completed {
                    let job = CleanupJob {
                        order_id: parties.order_id,
                    };
                    if let Err(e) = self.cleanup_tx.send(job).await {
                        tracing::error!(
                            order_id = parties.order_id,
                            "Cleanup worker unavailable: {e}"
                        );
                    }
                }
            }

            DomainEvent::OrderDeleted { parties } => {
                let wire = LiveEvent::order_deleted(parties.order_id);
                // Parties plus any connected admin session; union so nobody
                // gets a duplicate copy
                let mut sessions: BTreeSet<SessionId> =
                    [parties.customer_id, parties.shop_owner_id]
                        .iter()
                        .flat_map(|id| self.registry().user_sessions(*id))
                        .collect();
                sessions.extend(self.registry().role_sessions(UserRole::Admin));
                self.fanout.deliver_to_sessions(sessions, &wire);
            }

            DomainEvent::MessagePosted { parties, message } => {
                // The other parties on the order, never the sender. An
                // admin-authored message reaches both parties.
                let recipients: Vec<i64> = [parties.customer_id, parties.shop_owner_id]
                    .into_iter()
                    .filter(|id| *id != message.sender_id)
                    .collect();
                let wire = LiveEvent::new_message(&message);
                self.fanout.deliver_to_users(&recipients, &wire);
            }

            DomainEvent::ShopStatusToggled { shop, now } => {
                // Fresh verdict, not whatever the caller had cached
                let status = shop.unified_status(now);
                let wire = LiveEvent::ShopStatusChange {
                    shop_id: shop.id,
                    status,
                };
                let mut sessions: BTreeSet<SessionId> =
                    self.registry().shop_watchers(shop.id).into_iter().collect();
                sessions.extend(self.registry().user_sessions(shop.owner_id));
                self.fanout.deliver_to_sessions(sessions, &wire);
            }

            DomainEvent::NewNotification { notification } => {
                let user_id = notification.user_id;
                let wire = LiveEvent::NewNotification { notification };
                self.fanout.deliver_to_users(&[user_id], &wire);
            }
        }
    }
}
