//! Invariants of the live update hub: snapshot delivery, best-effort
//! pruning, and subscriber-set lifecycle.

use ordertogether::realtime::{ConnectionHandle, UpdateHub, UpdateNotice};
use tokio::sync::mpsc;

fn connection() -> (ConnectionHandle, mpsc::Receiver<UpdateNotice>) {
    let (tx, rx) = mpsc::channel(8);
    (ConnectionHandle::new(tx), rx)
}

// Scenario D: three subscribers, one dies, the rest keep receiving
#[test]
fn broadcast_reaches_all_then_prunes_the_dead() {
    let hub = UpdateHub::new();
    let (a, mut rx_a) = connection();
    let (b, rx_b) = connection();
    let (c, mut rx_c) = connection();

    hub.subscribe("order-x", a);
    hub.subscribe("order-x", b);
    hub.subscribe("order-x", c);

    assert_eq!(hub.broadcast("order-x", None), 3);
    let notice = rx_a.try_recv().unwrap();
    assert_eq!(
        serde_json::to_string(&notice).unwrap(),
        r#"{"type":"update","deadline":null}"#
    );

    // One connection goes away; its next send fails and it gets pruned
    drop(rx_b);
    assert_eq!(hub.broadcast("order-x", None), 2);
    assert_eq!(hub.subscriber_count("order-x"), 2);

    // Subsequent broadcasts reach only the remaining two
    assert_eq!(hub.broadcast("order-x", None), 2);
    assert!(rx_c.try_recv().is_ok());
}

#[test]
fn deadline_extension_carries_a_hint_other_mutations_do_not() {
    let hub = UpdateHub::new();
    let (h, mut rx) = connection();
    hub.subscribe("order-x", h);

    hub.broadcast("order-x", None);
    assert_eq!(rx.try_recv().unwrap().deadline, None);

    hub.broadcast("order-x", Some("2026-07-01T12:00:00Z".into()));
    assert_eq!(
        rx.try_recv().unwrap().deadline.as_deref(),
        Some("2026-07-01T12:00:00Z")
    );
}

#[test]
fn unsubscribe_is_idempotent_and_discards_empty_sets() {
    let hub = UpdateHub::new();
    let (h, _rx) = connection();
    let id = h.id();
    hub.subscribe("order-x", h);

    hub.unsubscribe("order-x", id);
    hub.unsubscribe("order-x", id);
    hub.unsubscribe("order-never-seen", id);

    assert_eq!(hub.active_orders(), 0);
    assert_eq!(hub.subscriber_count("order-x"), 0);
}

#[test]
fn broadcasts_never_cross_order_boundaries() {
    let hub = UpdateHub::new();
    let (hx, mut rx_x) = connection();
    let (hy, mut rx_y) = connection();
    hub.subscribe("order-x", hx);
    hub.subscribe("order-y", hy);

    assert_eq!(hub.broadcast("order-x", None), 1);
    assert!(rx_x.try_recv().is_ok());
    assert!(rx_y.try_recv().is_err());
}

#[tokio::test]
async fn subscriber_receives_across_tasks() {
    let hub = std::sync::Arc::new(UpdateHub::new());
    let (h, mut rx) = connection();
    hub.subscribe("order-x", h);

    let hub_clone = hub.clone();
    let broadcaster = tokio::spawn(async move {
        hub_clone.broadcast("order-x", None);
    });
    broadcaster.await.unwrap();

    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.kind, "update");
}
