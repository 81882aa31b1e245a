//! SessionRegistry — 连接会话注册表
//!
//! 管理所有活跃的 WebSocket 会话。每个会话持有一条 mpsc 通道，
//! 同一会话内的事件按派发顺序 FIFO 送达；跨会话无顺序保证。
//!
//! ```text
//! WS handler (connect)
//!       │ register → (SessionId, Receiver)
//!       ▼
//! SessionRegistry
//!   ├── sessions: SessionId → SessionHandle (user_id, role, Sender)
//!   ├── by_user:  user_id → {SessionId}   (一个用户允许多个会话，多端同步)
//!   └── shop_watchers: shop_id → {SessionId} (正在浏览店铺页的会话)
//! ```
//!
//! 注册表只做内存内的短操作，绝不跨网络 I/O 持锁：推送走 `try_send`，
//! 满或已关闭的通道由 fan-out 计数后丢弃（best-effort）。

mod dispatch;
mod fanout;

pub use dispatch::{DomainEvent, EventDispatcher, OrderParties};
pub use fanout::Fanout;

use dashmap::{DashMap, DashSet};
use shared::live::LiveEvent;
use shared::models::UserRole;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Runtime-only session identifier
pub type SessionId = u64;

/// Per-session outbound channel 容量 — 足以缓冲突发事件
const SESSION_CHANNEL_CAPACITY: usize = 64;

/// One connected client session
#[derive(Debug)]
struct SessionHandle {
    user_id: i64,
    role: UserRole,
    tx: mpsc::Sender<LiveEvent>,
}

/// Registry of connected sessions — 进程内唯一实例，启动时创建，关闭时清空
///
/// 取代隐式全局 socket 表：显式对象，注入到 dispatcher / WS handler。
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    sessions: DashMap<SessionId, SessionHandle>,
    /// user_id → 该用户的所有会话
    by_user: DashMap<i64, DashSet<SessionId>>,
    /// shop_id → 正在浏览该店铺公开页的会话
    shop_watchers: DashMap<i64, DashSet<SessionId>>,
    /// session → 当前浏览的 shop_id（反向索引，便于清理）
    watching: DashMap<SessionId, i64>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session on connect
    ///
    /// Returns the session id and the receiving end of its outbound channel;
    /// the WS handler forwards the receiver to the socket in FIFO order.
    pub fn register(&self, user_id: i64, role: UserRole) -> (SessionId, mpsc::Receiver<LiveEvent>) {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let session_id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.sessions
            .insert(session_id, SessionHandle { user_id, role, tx });
        self.by_user.entry(user_id).or_default().insert(session_id);

        tracing::debug!(session_id, user_id, role = %role, "Session registered");
        (session_id, rx)
    }

    /// Remove a session on disconnect, cleaning up all indexes
    pub fn unregister(&self, session_id: SessionId) {
        self.unwatch_shop(session_id);

        if let Some((_, handle)) = self.sessions.remove(&session_id) {
            if let Some(set) = self.by_user.get(&handle.user_id) {
                set.remove(&session_id);
                let empty = set.is_empty();
                drop(set);
                if empty {
                    self.by_user.remove(&handle.user_id);
                }
            }
            tracing::debug!(session_id, user_id = handle.user_id, "Session unregistered");
        }
    }

    /// Mark a session as viewing a shop's public page
    ///
    /// A session watches at most one shop at a time; watching a new shop
    /// replaces the previous subscription.
    pub fn watch_shop(&self, session_id: SessionId, shop_id: i64) {
        self.unwatch_shop(session_id);
        self.shop_watchers
            .entry(shop_id)
            .or_default()
            .insert(session_id);
        self.watching.insert(session_id, shop_id);
    }

    pub fn unwatch_shop(&self, session_id: SessionId) {
        if let Some((_, shop_id)) = self.watching.remove(&session_id) {
            if let Some(set) = self.shop_watchers.get(&shop_id) {
                set.remove(&session_id);
                let empty = set.is_empty();
                drop(set);
                if empty {
                    self.shop_watchers.remove(&shop_id);
                }
            }
        }
    }

    /// All session ids for one user (multi-tab/device)
    pub fn user_sessions(&self, user_id: i64) -> Vec<SessionId> {
        self.by_user
            .get(&user_id)
            .map(|set| set.iter().map(|id| *id).collect())
            .unwrap_or_default()
    }

    /// All session ids carrying the given role
    pub fn role_sessions(&self, role: UserRole) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|entry| entry.value().role == role)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Sessions currently viewing a shop's public page
    pub fn shop_watchers(&self, shop_id: i64) -> Vec<SessionId> {
        self.shop_watchers
            .get(&shop_id)
            .map(|set| set.iter().map(|id| *id).collect())
            .unwrap_or_default()
    }

    /// Push one event to one session's channel (non-blocking)
    ///
    /// Returns false when the session is gone or its channel is full — the
    /// caller counts the miss; a dropped push is never an error.
    pub fn send_to_session(&self, session_id: SessionId, event: LiveEvent) -> bool {
        match self.sessions.get(&session_id) {
            Some(handle) => handle.tx.try_send(event).is_ok(),
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop every session — 服务关闭时调用
    pub fn clear(&self) {
        self.sessions.clear();
        self.by_user.clear();
        self.shop_watchers.clear();
        self.watching.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup_by_user() {
        let registry = SessionRegistry::new();
        let (a, _rx_a) = registry.register(1, UserRole::Customer);
        let (b, _rx_b) = registry.register(1, UserRole::Customer);
        let (c, _rx_c) = registry.register(2, UserRole::ShopOwner);

        let mut sessions = registry.user_sessions(1);
        sessions.sort_unstable();
        assert_eq!(sessions, vec![a, b]);
        assert_eq!(registry.user_sessions(2), vec![c]);
        assert!(registry.user_sessions(99).is_empty());
        assert_eq!(registry.session_count(), 3);
    }

    #[test]
    fn unregister_cleans_all_indexes() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register(1, UserRole::Customer);
        registry.watch_shop(id, 7);
        assert_eq!(registry.shop_watchers(7), vec![id]);

        registry.unregister(id);
        assert!(registry.user_sessions(1).is_empty());
        assert!(registry.shop_watchers(7).is_empty());
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn watching_a_new_shop_replaces_the_old() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register(1, UserRole::Customer);

        registry.watch_shop(id, 7);
        registry.watch_shop(id, 8);
        assert!(registry.shop_watchers(7).is_empty());
        assert_eq!(registry.shop_watchers(8), vec![id]);
    }

    #[test]
    fn role_sessions_filter() {
        let registry = SessionRegistry::new();
        let (_a, _rx_a) = registry.register(1, UserRole::Customer);
        let (b, _rx_b) = registry.register(2, UserRole::Admin);
        let (c, _rx_c) = registry.register(3, UserRole::Admin);

        let mut admins = registry.role_sessions(UserRole::Admin);
        admins.sort_unstable();
        assert_eq!(admins, vec![b, c]);
    }

    #[tokio::test]
    async fn send_reaches_the_session_channel() {
        let registry = SessionRegistry::new();
        let (id, mut rx) = registry.register(1, UserRole::Customer);

        assert!(registry.send_to_session(id, LiveEvent::Connected { user_id: 1 }));
        assert_eq!(rx.recv().await, Some(LiveEvent::Connected { user_id: 1 }));

        registry.unregister(id);
        assert!(!registry.send_to_session(id, LiveEvent::Connected { user_id: 1 }));
    }

    #[test]
    fn clear_empties_everything() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register(1, UserRole::Customer);
        registry.watch_shop(id, 7);

        registry.clear();
        assert_eq!(registry.session_count(), 0);
        assert!(registry.shop_watchers(7).is_empty());
    }
}
