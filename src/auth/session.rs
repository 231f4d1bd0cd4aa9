//! # Session Context & Store
//!
//! The session is modelled as an explicit context object passed into core
//! operations, never as ambient state. A context is created on first
//! contact, mutated by the identity-changing operations, and cleared
//! explicitly on logout.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::crypto::{generate_token, hash_token};
use super::identity::Identity;
use crate::errors::{AppError, AppResult};

/// Per-session state: the resolved identity plus admin grants
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    identity: Option<Identity>,
    admin_orders: HashSet<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the current identity, initialising a fresh anonymous one on
    /// first call. Idempotent thereafter: the anonymous key is generated
    /// once and stays stable for the session's life.
    pub fn resolve(&mut self) -> Identity {
        match &self.identity {
            Some(identity) => identity.clone(),
            None => {
                let identity = Identity::Anonymous {
                    key: generate_token(),
                    display_name: String::new(),
                };
                self.identity = Some(identity.clone());
                identity
            }
        }
    }

    /// The current identity without initialising one
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Replace the identity with an external-auth assertion
    pub fn become_external(&mut self, key: &str, display_name: &str) {
        self.identity = Some(Identity::External {
            key: key.to_string(),
            display_name: display_name.to_string(),
        });
    }

    /// Replace the identity with a redeemed invite token
    pub fn become_invite(&mut self, token: &str, display_name: &str) {
        self.identity = Some(Identity::Invite {
            token: token.to_string(),
            display_name: display_name.to_string(),
        });
    }

    /// Full session reset. The next `resolve` yields a brand-new anonymous
    /// identity, and all admin grants are gone.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Remember a display name chosen by an anonymous or external identity
    pub fn remember_display_name(&mut self, name: &str) {
        if let Some(identity) = &mut self.identity {
            identity.set_display_name(name);
        }
    }

    /// Record an admin grant for an order (idempotent)
    pub fn grant_admin(&mut self, order_id: &str) {
        self.admin_orders.insert(order_id.to_string());
    }

    /// Whether this session holds an admin grant for the order
    pub fn has_admin_grant(&self, order_id: &str) -> bool {
        self.admin_orders.contains(order_id)
    }

    /// Number of admin grants held (used by idempotence tests)
    pub fn admin_grant_count(&self) -> usize {
        self.admin_orders.len()
    }
}

/// Idle sessions older than this are evicted
const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug)]
struct SessionEntry {
    context: SessionContext,
    touched: Instant,
}

impl SessionEntry {
    fn expired(&self, ttl: Duration) -> bool {
        self.touched.elapsed() > ttl
    }
}

/// Process-local session registry keyed by an opaque cookie id.
///
/// Cookie ids are stored hashed; the raw id only lives in the client's
/// cookie. Entries are evicted when idle past the TTL, logout removes the
/// entry outright, and expired entries are pruned whenever a new session is
/// created, so the map stays bounded by active traffic.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a new empty session, returning the raw cookie id. Expired
    /// entries (including ones orphaned by failed requests) are pruned here.
    pub fn create(&self) -> AppResult<String> {
        let id = generate_token();
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AppError::Storage("Lock poisoned".to_string()))?;
        let ttl = self.ttl;
        sessions.retain(|_, entry| !entry.expired(ttl));
        sessions.insert(
            hash_token(&id),
            SessionEntry {
                context: SessionContext::new(),
                touched: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Whether a live (non-expired) session exists for this cookie id
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .map(|s| {
                s.get(&hash_token(session_id))
                    .is_some_and(|entry| !entry.expired(self.ttl))
            })
            .unwrap_or(false)
    }

    /// Run a closure against the session for this cookie id, refreshing its
    /// idle timer. An expired session is removed and treated as absent.
    pub fn update<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut SessionContext) -> T,
    ) -> AppResult<T> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AppError::Storage("Lock poisoned".to_string()))?;
        let key = hash_token(session_id);
        if sessions.get(&key).is_some_and(|e| e.expired(self.ttl)) {
            sessions.remove(&key);
        }
        let entry = sessions.get_mut(&key).ok_or(AppError::NotFound)?;
        entry.touched = Instant::now();
        Ok(f(&mut entry.context))
    }

    /// Drop the session entirely. Removing an unknown id is a no-op; the
    /// next request with that cookie starts fresh.
    pub fn remove(&self, session_id: &str) -> AppResult<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AppError::Storage("Lock poisoned".to_string()))?;
        sessions.remove(&hash_token(session_id));
        Ok(())
    }

    /// Number of live entries (expired ones count until pruned)
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
