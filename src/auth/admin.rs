//! # Admin Grant Protocol
//!
//! An order's admin secret is generated once at creation and never
//! regenerated. Presenting the correct `(order, secret)` pair upgrades the
//! session; the order's external-auth creator is recognised as admin without
//! ever needing the secret URL.

use super::crypto::constant_time_str_eq;
use super::identity::Identity;
use super::session::SessionContext;
use crate::errors::{AppError, AppResult};
use crate::orders::Order;

/// Error message shared by "unknown order" and "wrong secret" so a failed
/// grant never confirms that an order exists.
pub const INVALID_ADMIN_LINK: &str = "invalid admin link";

/// Redeem the admin secret for an order, upgrading this session.
///
/// Idempotent: redeeming twice leaves a single grant. A mismatched secret
/// fails closed with no session mutation.
pub fn grant_admin(
    session: &mut SessionContext,
    order: &Order,
    presented_secret: &str,
) -> AppResult<()> {
    if !constant_time_str_eq(&order.admin_secret, presented_secret) {
        return Err(AppError::forbidden(INVALID_ADMIN_LINK));
    }
    session.grant_admin(&order.id);
    Ok(())
}

/// Whether this session has admin rights for the order.
///
/// True for sessions holding a grant, and for external identities whose key
/// matches the order's creator key.
pub fn is_admin(session: &SessionContext, order: &Order) -> bool {
    if session.has_admin_grant(&order.id) {
        return true;
    }
    match session.identity() {
        Some(Identity::External { key, .. }) => {
            order.creator_external_key.as_deref() == Some(key.as_str())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::NewOrder;
    use chrono::Utc;

    fn external_creator() -> Identity {
        Identity::External {
            key: "creator-sub".into(),
            display_name: "Creator".into(),
        }
    }

    fn order_by(creator: &Identity) -> Order {
        Order::create(
            NewOrder {
                vendor_name: "Bakery".into(),
                vendor_url: "https://bakery.example".into(),
                payment_url: None,
                deadline: Utc::now(),
                invite_only: false,
                allow_external_without_invite: false,
                privacy_mode: false,
            },
            creator,
        )
    }

    #[test]
    fn test_grant_with_correct_secret() {
        let creator = external_creator();
        let order = order_by(&creator);
        let mut session = SessionContext::new();
        session.resolve();

        let secret = order.admin_secret.clone();
        grant_admin(&mut session, &order, &secret).unwrap();
        assert!(is_admin(&session, &order));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let order = order_by(&external_creator());
        let mut session = SessionContext::new();

        let secret = order.admin_secret.clone();
        grant_admin(&mut session, &order, &secret).unwrap();
        grant_admin(&mut session, &order, &secret).unwrap();

        assert_eq!(session.admin_grant_count(), 1);
    }

    #[test]
    fn test_wrong_secret_fails_without_mutation() {
        let order = order_by(&external_creator());
        let mut session = SessionContext::new();

        let result = grant_admin(&mut session, &order, "guessed-secret");
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(session.admin_grant_count(), 0);
        assert!(!is_admin(&session, &order));
    }

    #[test]
    fn test_creator_recognised_across_sessions() {
        let creator = external_creator();
        let order = order_by(&creator);

        // A brand-new session asserting the same external key is admin
        // without any secret visit
        let mut fresh = SessionContext::new();
        fresh.become_external("creator-sub", "Creator Elsewhere");
        assert!(is_admin(&fresh, &order));

        // A different external key is not
        let mut other = SessionContext::new();
        other.become_external("someone-else", "Stranger");
        assert!(!is_admin(&other, &order));
    }

    #[test]
    fn test_anonymous_creator_not_auto_admin() {
        let anon = Identity::Anonymous {
            key: "anon-key".into(),
            display_name: String::new(),
        };
        let order = order_by(&anon);
        assert!(order.creator_external_key.is_none());

        let mut session = SessionContext::new();
        session.resolve();
        assert!(!is_admin(&session, &order));
    }
}
