//! # Live Update Hub
//!
//! Per-order subscriber sets with best-effort fan-out. A broadcast only
//! tells clients that something changed; they re-fetch authoritative state
//! themselves, so losing a notification degrades UI freshness, never
//! correctness.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

macro_rules! log_info {
    ($($arg:tt)*) => {
        eprintln!("[INFO] {}", format!($($arg)*));
    };
}

/// Wire payload pushed to subscribers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpdateNotice {
    #[serde(rename = "type")]
    pub kind: &'static str,

    /// ISO-8601 UTC deadline, populated only on deadline extensions so
    /// clients can update a countdown without a full refetch
    pub deadline: Option<String>,
}

impl UpdateNotice {
    pub fn new(deadline: Option<String>) -> Self {
        Self {
            kind: "update",
            deadline,
        }
    }
}

/// Handle for one live connection: an id plus the bounded channel feeding
/// its WebSocket writer task
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    sender: mpsc::Sender<UpdateNotice>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::Sender<UpdateNotice>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Non-blocking push. A full or closed channel counts as a dead
    /// connection; a stalled client must never stall the broadcaster.
    fn push(&self, notice: UpdateNotice) -> bool {
        self.sender.try_send(notice).is_ok()
    }
}

/// Registry of live connections per order.
///
/// The only structure shared across request handlers and connection
/// lifetimes. One coarse lock; orders are independent and contention is low.
#[derive(Debug, Default)]
pub struct UpdateHub {
    subscribers: RwLock<HashMap<String, Vec<ConnectionHandle>>>,
}

impl UpdateHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to an order's subscriber set (created on demand)
    pub fn subscribe(&self, order_id: &str, handle: ConnectionHandle) {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.entry(order_id.to_string()).or_default().push(handle);
        }
    }

    /// Remove a connection. Idempotent: unsubscribing an unknown connection
    /// is a no-op. Empty sets are discarded so the map never accumulates
    /// dead entries.
    pub fn unsubscribe(&self, order_id: &str, connection_id: Uuid) {
        if let Ok(mut subs) = self.subscribers.write() {
            if let Some(handles) = subs.get_mut(order_id) {
                handles.retain(|h| h.id != connection_id);
                if handles.is_empty() {
                    subs.remove(order_id);
                }
            }
        }
    }

    /// Fan out an update notice to every current subscriber of the order.
    ///
    /// Iterates over a snapshot, so connections joining mid-broadcast miss
    /// this one and concurrent unsubscribes cannot corrupt iteration. A
    /// failed send prunes that one connection and delivery to the rest
    /// continues. Never fails; returns the delivered count for logging.
    pub fn broadcast(&self, order_id: &str, deadline_hint: Option<String>) -> usize {
        let snapshot: Vec<ConnectionHandle> = match self.subscribers.read() {
            Ok(subs) => subs.get(order_id).cloned().unwrap_or_default(),
            Err(_) => return 0,
        };

        if snapshot.is_empty() {
            return 0;
        }

        let notice = UpdateNotice::new(deadline_hint);
        let mut delivered = 0;
        let mut dead: Vec<Uuid> = Vec::new();

        for handle in &snapshot {
            if handle.push(notice.clone()) {
                delivered += 1;
            } else {
                dead.push(handle.id);
            }
        }

        for id in dead {
            log_info!("pruning dead subscriber {} of order {}", id, order_id);
            self.unsubscribe(order_id, id);
        }

        delivered
    }

    /// Current subscriber count for an order
    pub fn subscriber_count(&self, order_id: &str) -> usize {
        self.subscribers
            .read()
            .map(|subs| subs.get(order_id).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of orders with at least one subscriber
    pub fn active_orders(&self) -> usize {
        self.subscribers.read().map(|subs| subs.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(capacity: usize) -> (ConnectionHandle, mpsc::Receiver<UpdateNotice>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ConnectionHandle::new(tx), rx)
    }

    #[test]
    fn test_subscribe_and_broadcast() {
        let hub = UpdateHub::new();
        let (h1, mut rx1) = connection(4);
        let (h2, mut rx2) = connection(4);
        let (h3, mut rx3) = connection(4);

        hub.subscribe("order-x", h1);
        hub.subscribe("order-x", h2);
        hub.subscribe("order-x", h3);
        assert_eq!(hub.subscriber_count("order-x"), 3);

        let delivered = hub.broadcast("order-x", None);
        assert_eq!(delivered, 3);

        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            let notice = rx.try_recv().unwrap();
            assert_eq!(
                serde_json::to_string(&notice).unwrap(),
                r#"{"type":"update","deadline":null}"#
            );
        }
    }

    #[test]
    fn test_deadline_hint_in_payload() {
        let hub = UpdateHub::new();
        let (h, mut rx) = connection(1);
        hub.subscribe("order-x", h);

        hub.broadcast("order-x", Some("2026-06-01T16:30:00Z".to_string()));
        let notice = rx.try_recv().unwrap();
        assert_eq!(
            serde_json::to_string(&notice).unwrap(),
            r#"{"type":"update","deadline":"2026-06-01T16:30:00Z"}"#
        );
    }

    #[test]
    fn test_failed_send_prunes_only_that_connection() {
        let hub = UpdateHub::new();
        let (alive1, mut rx1) = connection(4);
        let (alive2, mut rx2) = connection(4);
        let (dead, dead_rx) = connection(4);

        hub.subscribe("order-x", alive1);
        hub.subscribe("order-x", dead);
        hub.subscribe("order-x", alive2);

        // Closed receiver makes the middle connection fail
        drop(dead_rx);

        let delivered = hub.broadcast("order-x", None);
        assert_eq!(delivered, 2);
        assert_eq!(hub.subscriber_count("order-x"), 2);

        // The next broadcast reaches only the survivors
        assert_eq!(hub.broadcast("order-x", None), 2);
        assert_eq!(rx1.try_recv().unwrap().kind, "update");
        assert_eq!(rx1.try_recv().unwrap().kind, "update");
        assert_eq!(rx2.try_recv().unwrap().kind, "update");
        assert_eq!(rx2.try_recv().unwrap().kind, "update");
    }

    #[test]
    fn test_full_channel_counts_as_dead() {
        let hub = UpdateHub::new();
        let (stalled, _rx) = connection(1);
        hub.subscribe("order-x", stalled);

        // First fills the bounded channel, second cannot be delivered
        assert_eq!(hub.broadcast("order-x", None), 1);
        assert_eq!(hub.broadcast("order-x", None), 0);
        assert_eq!(hub.subscriber_count("order-x"), 0);
    }

    #[test]
    fn test_unsubscribe_discards_empty_sets() {
        let hub = UpdateHub::new();
        let (h, _rx) = connection(1);
        let id = h.id();

        hub.subscribe("order-x", h);
        assert_eq!(hub.active_orders(), 1);

        hub.unsubscribe("order-x", id);
        assert_eq!(hub.active_orders(), 0);

        // Double-unsubscribe is a no-op, not an error
        hub.unsubscribe("order-x", id);
        assert_eq!(hub.active_orders(), 0);
    }

    #[test]
    fn test_broadcast_to_unknown_order_is_noop() {
        let hub = UpdateHub::new();
        assert_eq!(hub.broadcast("nobody-home", None), 0);
    }

    #[test]
    fn test_orders_are_independent() {
        let hub = UpdateHub::new();
        let (hx, mut rx_x) = connection(1);
        let (hy, mut rx_y) = connection(1);

        hub.subscribe("order-x", hx);
        hub.subscribe("order-y", hy);

        hub.broadcast("order-x", None);
        assert!(rx_x.try_recv().is_ok());
        assert!(rx_y.try_recv().is_err());
    }
}
