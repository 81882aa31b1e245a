//! Notification fan-out
//!
//! Pushes one wire event to every connected session of a resolved recipient
//! set. Each session receives an independent copy (multi-device consistency);
//! per-session ordering is the channel's FIFO order. A missing or saturated
//! session is a counted best-effort miss, never an error.

use shared::live::LiveEvent;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{SessionId, SessionRegistry};

/// Fan-out over the session registry
#[derive(Debug)]
pub struct Fanout {
    registry: Arc<SessionRegistry>,
    /// Best-effort misses (no session, closed, or full channel) — for
    /// observability only
    dropped: AtomicU64,
}

impl Fanout {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Total dropped deliveries since startup
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Deliver one event to every session of every listed user
    ///
    /// Duplicate user ids are collapsed so no session receives the same event
    /// twice from a single dispatch.
    pub fn deliver_to_users(&self, user_ids: &[i64], event: &LiveEvent) {
        let sessions: BTreeSet<SessionId> = user_ids
            .iter()
            .flat_map(|id| self.registry.user_sessions(*id))
            .collect();
        self.deliver_to_sessions(sessions, event);
    }

    /// Deliver to an already-resolved session set
    pub fn deliver_to_sessions(
        &self,
        sessions: impl IntoIterator<Item = SessionId>,
        event: &LiveEvent,
    ) {
        for session_id in sessions {
            if !self.registry.send_to_session(session_id, event.clone()) {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    session_id,
                    total_dropped = total,
                    "Dropped live event for stale or saturated session"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::UserRole;

    fn event() -> LiveEvent {
        LiveEvent::Connected { user_id: 0 }
    }

    #[tokio::test]
    async fn every_session_of_a_user_gets_a_copy() {
        let registry = Arc::new(SessionRegistry::new());
        let fanout = Fanout::new(registry.clone());
        let (_a, mut rx_a) = registry.register(1, UserRole::Customer);
        let (_b, mut rx_b) = registry.register(1, UserRole::Customer);

        fanout.deliver_to_users(&[1], &event());
        assert_eq!(rx_a.recv().await, Some(event()));
        assert_eq!(rx_b.recv().await, Some(event()));
        assert_eq!(fanout.dropped_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_recipients_collapse() {
        let registry = Arc::new(SessionRegistry::new());
        let fanout = Fanout::new(registry.clone());
        let (_a, mut rx) = registry.register(1, UserRole::Customer);

        fanout.deliver_to_users(&[1, 1], &event());
        assert_eq!(rx.recv().await, Some(event()));
        assert!(rx.try_recv().is_err(), "event must not arrive twice");
    }

    #[test]
    fn missing_recipient_is_a_counted_miss_not_an_error() {
        let registry = Arc::new(SessionRegistry::new());
        let fanout = Fanout::new(registry.clone());

        // No session for user 42 — nothing to deliver, nothing dropped
        fanout.deliver_to_users(&[42], &event());
        assert_eq!(fanout.dropped_count(), 0);

        // A stale session id is a real miss
        fanout.deliver_to_sessions([999], &event());
        assert_eq!(fanout.dropped_count(), 1);
    }

    #[tokio::test]
    async fn saturated_channel_drops_without_blocking() {
        let registry = Arc::new(SessionRegistry::new());
        let fanout = Fanout::new(registry.clone());
        let (id, mut rx) = registry.register(1, UserRole::Customer);

        // Fill the channel without a reader, then one more
        let mut sent = 0;
        while registry.send_to_session(id, event()) {
            sent += 1;
            assert!(sent < 10_000, "channel never filled");
        }
        fanout.deliver_to_sessions([id], &event());
        assert_eq!(fanout.dropped_count(), 1);

        // Earlier events are still there, in order
        assert_eq!(rx.recv().await, Some(event()));
    }
}
