/// Connection registry: which live connections represent which user
///
/// The registry maps a user id to the set of currently open WebSocket
/// connections for that user (one per browser tab). Connections are
/// represented by the sending half of an unbounded channel; the WebSocket
/// handler owns the receiving half and forwards frames to the socket.
///
/// Lifecycle per connection: registered after the socket authenticates,
/// unregistered on close. There is no reconnect tracking; a client-side
/// reconnect produces a brand-new registration.
///
/// # Example
///
/// ```
/// use synergysphere_shared::realtime::registry::ConnectionRegistry;
/// use tokio::sync::mpsc;
/// use uuid::Uuid;
///
/// let registry = ConnectionRegistry::new();
/// let user_id = Uuid::new_v4();
///
/// let (tx, _rx) = mpsc::unbounded_channel();
/// let conn_id = registry.register(user_id, tx);
///
/// let outcome = registry.send_to_user(user_id, "{\"type\":\"notification\"}");
/// assert_eq!(outcome.delivered, 1);
///
/// registry.unregister(conn_id);
/// assert!(!registry.is_open(conn_id));
/// ```

use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

/// Opaque identifier of a registered connection
pub type ConnectionId = u64;

/// One live connection: its id and the channel into its WebSocket writer task
#[derive(Debug, Clone)]
struct ConnectionHandle {
    id: ConnectionId,
    tx: UnboundedSender<Message>,
}

impl ConnectionHandle {
    /// Whether the transport still reports open at send time
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Result of a best-effort send to all connections of one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOutcome {
    /// Frames accepted by an open connection
    pub delivered: usize,

    /// Connections that were already closed and silently skipped
    pub skipped: usize,

    /// Sends that failed despite the connection reporting open
    pub failed: usize,
}

impl SendOutcome {
    /// True iff at least one send succeeded
    pub fn any_delivered(&self) -> bool {
        self.delivered > 0
    }
}

/// Registry of live connections, keyed by user id
///
/// Constructed once at startup and shared through the application state;
/// never a module-level singleton. All methods take `&self` — interior
/// mutability via a mutex that is never held across an await point.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<Uuid, Vec<ConnectionHandle>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the user's set, creating the set if absent
    ///
    /// There is no limit on concurrent connections per user (multi-tab
    /// support). Returns the id used to unregister the connection later.
    pub fn register(&self, user_id: Uuid, tx: UnboundedSender<Message>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut connections = self.connections.lock().expect("registry lock poisoned");
        connections
            .entry(user_id)
            .or_default()
            .push(ConnectionHandle { id, tx });

        debug!(%user_id, connection_id = id, "Registered connection");
        id
    }

    /// Removes a connection, dropping the user's entry when it becomes empty
    ///
    /// Linear scan over all entries; registries stay small so this is fine.
    pub fn unregister(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.lock().expect("registry lock poisoned");

        let mut emptied_user = None;
        for (user_id, handles) in connections.iter_mut() {
            let before = handles.len();
            handles.retain(|h| h.id != connection_id);
            if handles.len() < before {
                debug!(%user_id, connection_id, "Unregistered connection");
                if handles.is_empty() {
                    emptied_user = Some(*user_id);
                }
                break;
            }
        }

        if let Some(user_id) = emptied_user {
            connections.remove(&user_id);
        }
    }

    /// Whether the connection is registered and its transport reports open
    pub fn is_open(&self, connection_id: ConnectionId) -> bool {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections
            .values()
            .flatten()
            .any(|h| h.id == connection_id && h.is_open())
    }

    /// Sends a serialized payload to every open connection of a user
    ///
    /// Best-effort: closed connections are skipped, never retried, never
    /// queued. Each send is an independent, unordered channel push.
    pub fn send_to_user(&self, user_id: Uuid, payload: &str) -> SendOutcome {
        // Snapshot the handles so the lock is not held while pushing frames.
        let handles: Vec<ConnectionHandle> = {
            let connections = self.connections.lock().expect("registry lock poisoned");
            connections.get(&user_id).cloned().unwrap_or_default()
        };

        let mut outcome = SendOutcome::default();
        for handle in handles {
            if !handle.is_open() {
                outcome.skipped += 1;
                continue;
            }
            match handle.tx.send(Message::Text(payload.to_string())) {
                Ok(()) => outcome.delivered += 1,
                Err(_) => outcome.failed += 1,
            }
        }

        outcome
    }

    /// Total number of registered connections (for the health endpoint)
    pub fn connection_count(&self) -> usize {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_register_and_send() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(user_id, tx);

        let outcome = registry.send_to_user(user_id, "hello");
        assert_eq!(outcome.delivered, 1);
        assert!(outcome.any_delivered());

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame, Message::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn test_multi_tab_receives_identical_payload() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.register(user_id, tx1);
        registry.register(user_id, tx2);

        let outcome = registry.send_to_user(user_id, "{\"type\":\"project_updated\"}");
        assert_eq!(outcome.delivered, 2);

        let frame1 = rx1.recv().await.unwrap();
        let frame2 = rx2.recv().await.unwrap();
        assert_eq!(frame1, frame2);
    }

    #[tokio::test]
    async fn test_closed_connection_is_skipped() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (tx_open, mut rx_open) = mpsc::unbounded_channel();
        let (tx_closed, rx_closed) = mpsc::unbounded_channel();
        registry.register(user_id, tx_open);
        registry.register(user_id, tx_closed);

        // One tab closes before the broadcast.
        drop(rx_closed);

        let outcome = registry.send_to_user(user_id, "payload");
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);

        assert!(rx_open.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_send_to_unknown_user_is_noop() {
        let registry = ConnectionRegistry::new();
        let outcome = registry.send_to_user(Uuid::new_v4(), "payload");
        assert_eq!(outcome, SendOutcome::default());
        assert!(!outcome.any_delivered());
    }

    #[tokio::test]
    async fn test_unregister_leaves_no_empty_entry() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (tx, _rx) = mpsc::unbounded_channel();
        let conn_id = registry.register(user_id, tx);
        assert_eq!(registry.connection_count(), 1);
        assert!(registry.is_open(conn_id));

        registry.unregister(conn_id);
        assert_eq!(registry.connection_count(), 0);
        assert!(!registry.is_open(conn_id));

        // The user's entry is gone entirely, not left as an empty set.
        let map = registry.connections.lock().unwrap();
        assert!(!map.contains_key(&user_id));
    }

    #[tokio::test]
    async fn test_unregister_keeps_remaining_tab() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let conn1 = registry.register(user_id, tx1);
        registry.register(user_id, tx2);

        registry.unregister(conn1);
        assert_eq!(registry.connection_count(), 1);

        let outcome = registry.send_to_user(user_id, "still here");
        assert_eq!(outcome.delivered, 1);
        assert!(rx2.recv().await.is_some());
    }
}
