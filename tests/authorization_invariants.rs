//! End-to-end invariants over identity resolution, authorization, the admin
//! grant protocol, and the deadline gate, exercised against the in-memory
//! store the same way the HTTP layer drives the core.

use chrono::{Duration, Utc};

use ordertogether::auth::admin::{grant_admin, is_admin};
use ordertogether::auth::{Identity, IdentityKind, Policy, SessionContext};
use ordertogether::deadline::check_write_allowed;
use ordertogether::errors::AppError;
use ordertogether::orders::{
    InviteToken, ItemFields, MemoryOrderStore, NewOrder, Order, OrderItem, OrderStore,
};

fn open_order(creator: &Identity, deadline_offset: Duration) -> Order {
    Order::create(
        NewOrder {
            vendor_name: "Taqueria".into(),
            vendor_url: "https://taqueria.example".into(),
            payment_url: None,
            deadline: Utc::now() + deadline_offset,
            invite_only: false,
            allow_external_without_invite: false,
            privacy_mode: false,
        },
        creator,
    )
}

fn invite_only_order(creator: &Identity) -> Order {
    Order::create(
        NewOrder {
            vendor_name: "Taqueria".into(),
            vendor_url: "https://taqueria.example".into(),
            payment_url: None,
            deadline: Utc::now() + Duration::hours(2),
            invite_only: true,
            allow_external_without_invite: false,
            privacy_mode: false,
        },
        creator,
    )
}

fn fields(product: &str) -> ItemFields {
    ItemFields {
        product_name: product.into(),
        product_sku: None,
        product_url: None,
        quantity: "1".into(),
        note: None,
    }
}

// Scenario A: a fresh session resolves to a stable anonymous identity
#[test]
fn fresh_session_resolves_stable_anonymous_identity() {
    let mut session = SessionContext::new();

    let first = session.resolve();
    assert_eq!(first.kind(), IdentityKind::Anonymous);
    assert!(!first.external_key().is_empty());
    assert!(first.display_name().is_empty());

    let second = session.resolve();
    assert_eq!(first.external_key(), second.external_key());
}

// Scenario B: invite-only order admits invitees, not unapproved externals
#[test]
fn invite_only_order_gates_external_identities() {
    let policy = Policy::new(true);
    let creator = Identity::External {
        key: "creator".into(),
        display_name: "Creator".into(),
    };
    let order = invite_only_order(&creator);

    let external = Identity::External {
        key: "visitor".into(),
        display_name: "Visitor".into(),
    };
    assert!(!policy.can_add_item(&external, &order, false));

    let invited = Identity::Invite {
        token: "tok-1".into(),
        display_name: "Alice".into(),
    };
    assert!(policy.can_add_item(&invited, &order, false));
}

// Scenario C: past-deadline orders reject non-admin writes but not admin ones
#[test]
fn closed_order_blocks_everyone_but_the_admin() {
    let creator = Identity::External {
        key: "creator".into(),
        display_name: "Creator".into(),
    };
    let order = open_order(&creator, Duration::hours(-1));
    let now = Utc::now();

    let denied = check_write_allowed(order.deadline, now, false);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    assert!(check_write_allowed(order.deadline, now, true).is_ok());
}

// Scenario E: the external creator is admin on a brand-new session
#[test]
fn external_creator_is_admin_without_secret_visit() {
    let creator = Identity::External {
        key: "creator-sub".into(),
        display_name: "Creator".into(),
    };
    let order = open_order(&creator, Duration::hours(2));

    let mut fresh = SessionContext::new();
    fresh.become_external("creator-sub", "Same Person, New Browser");
    assert!(is_admin(&fresh, &order));
}

#[test]
fn invite_token_is_durable_and_multi_redeemable() {
    let store = MemoryOrderStore::new();
    let creator = Identity::External {
        key: "creator".into(),
        display_name: "Creator".into(),
    };
    let order = invite_only_order(&creator);
    store.insert_order(&order).unwrap();

    let token = InviteToken::issue(&order.id, "Alice");
    store.insert_token(&token).unwrap();

    // Two sessions redeem the same token and become the same participant
    let mut laptop = SessionContext::new();
    let mut phone = SessionContext::new();
    for session in [&mut laptop, &mut phone] {
        let invite = store.get_token(&order.id, &token.token).unwrap().unwrap();
        session.become_invite(&invite.token, &invite.display_name);
    }

    let a = laptop.resolve();
    let b = phone.resolve();
    assert_eq!(a.external_key(), b.external_key());
    assert_eq!(a.display_name(), "Alice");

    // Still redeemable afterwards
    assert!(store.get_token(&order.id, &token.token).unwrap().is_some());
}

#[test]
fn grant_survives_for_session_but_wrong_secret_never_mutates() {
    let creator = Identity::Anonymous {
        key: "anon".into(),
        display_name: String::new(),
    };
    let order = open_order(&creator, Duration::hours(2));
    let mut session = SessionContext::new();
    session.resolve();

    assert!(grant_admin(&mut session, &order, "wrong").is_err());
    assert!(!is_admin(&session, &order));

    let secret = order.admin_secret.clone();
    grant_admin(&mut session, &order, &secret).unwrap();
    grant_admin(&mut session, &order, &secret).unwrap();
    assert!(is_admin(&session, &order));
}

#[test]
fn privacy_mode_hides_items_from_other_participants() {
    let policy = Policy::new(true);
    let creator = Identity::External {
        key: "creator".into(),
        display_name: "Creator".into(),
    };
    let order = Order::create(
        NewOrder {
            vendor_name: "Taqueria".into(),
            vendor_url: "https://taqueria.example".into(),
            payment_url: None,
            deadline: Utc::now() + Duration::hours(2),
            invite_only: true,
            allow_external_without_invite: false,
            privacy_mode: true,
        },
        &creator,
    );

    let store = MemoryOrderStore::new();
    store.insert_order(&order).unwrap();
    let item = OrderItem::create(&order.id, "tok-alice", "Alice", fields("Tacos"));
    store.insert_item(&item).unwrap();

    let alice = Identity::Invite {
        token: "tok-alice".into(),
        display_name: "Alice".into(),
    };
    let bob = Identity::Invite {
        token: "tok-bob".into(),
        display_name: "Bob".into(),
    };

    let stored = store.get_item(&order.id, &item.id).unwrap().unwrap();
    assert!(policy.can_see_item(&alice, &stored, &order, false));
    assert!(!policy.can_see_item(&bob, &stored, &order, false));

    // The admin sees everything
    let mut admin_session = SessionContext::new();
    admin_session.become_external("creator", "Creator");
    assert!(is_admin(&admin_session, &order));
    assert!(policy.can_see_item(
        &admin_session.resolve(),
        &stored,
        &order,
        true
    ));
}
