//! Authentication state store
//!
//! Holds two maps behind a single mutex:
//!
//! - session bindings: `session -> identity`, sticky once set
//! - auth records: `identity -> last authenticated at`, one per identity
//!
//! An identity is *currently authenticated* iff
//! `now - last_authenticated_at < auth_window`. The predicate is recomputed
//! on every check; nothing is swept or evicted. Stale entries stay in memory
//! and simply stop satisfying the predicate.
//!
//! The gate (many concurrent tool calls) and the login notifier (HTTP
//! handler) share one [`AuthStateStore`] through an `Arc`. Every operation
//! takes the lock once and never awaits while holding it.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::clock::{Clock, SystemClock};
use super::{Identity, SessionId};

/// How long a login stays valid when nothing else is configured, in minutes.
pub const DEFAULT_AUTH_WINDOW_MINUTES: i64 = 30;

/// The most recent successful login for an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthRecord {
    /// Who logged in.
    pub identity: Identity,
    /// When they last completed login.
    pub last_authenticated_at: DateTime<Utc>,
}

/// Result of [`AuthStateStore::bind_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// The session had no binding and is now bound.
    Created,
    /// The session was already bound to the same identity.
    Unchanged,
    /// The session is bound to a different identity; nothing changed.
    Conflict {
        /// The identity the session remains bound to.
        existing: Identity,
    },
}

impl BindOutcome {
    /// Returns `true` when the session ends up bound to the requested identity.
    pub fn is_bound(&self) -> bool {
        !matches!(self, BindOutcome::Conflict { .. })
    }
}

/// Counts for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    /// Number of session bindings held.
    pub bound_sessions: usize,
    /// Number of identities with an auth record (fresh or stale).
    pub known_identities: usize,
    /// Number of identities whose record is inside the auth window.
    pub authenticated_identities: usize,
}

#[derive(Debug, Default)]
struct StoreState {
    bindings: HashMap<SessionId, Identity>,
    records: HashMap<Identity, DateTime<Utc>>,
}

impl StoreState {
    fn is_fresh(&self, identity: &Identity, now: DateTime<Utc>, window: Duration) -> bool {
        self.records
            .get(identity)
            .map(|at| now.signed_duration_since(*at) < window)
            .unwrap_or(false)
    }

    fn bind(&mut self, session: &SessionId, identity: &Identity) -> BindOutcome {
        match self.bindings.get(session) {
            Some(existing) if existing == identity => BindOutcome::Unchanged,
            Some(existing) => BindOutcome::Conflict {
                existing: existing.clone(),
            },
            None => {
                self.bindings.insert(session.clone(), identity.clone());
                BindOutcome::Created
            }
        }
    }

    // Most recent login wins; equal timestamps go to the smallest identity.
    fn most_recent_fresh(&self, now: DateTime<Utc>, window: Duration) -> Option<Identity> {
        self.records
            .iter()
            .filter(|(_, at)| now.signed_duration_since(**at) < window)
            .max_by(|(id_a, at_a), (id_b, at_b)| at_a.cmp(at_b).then_with(|| id_b.cmp(id_a)))
            .map(|(id, _)| id.clone())
    }
}

/// In-memory store of session bindings and login records.
///
/// # Examples
///
/// ```
/// use toolgate::auth::{AuthStateStore, BindOutcome, Identity, SessionId};
///
/// let store = AuthStateStore::default();
/// let id = Identity::from("+15550001111");
/// let session = SessionId::from("sessA");
///
/// store.record_login(&id);
/// assert_eq!(store.bind_session(&session, &id), BindOutcome::Created);
/// assert_eq!(store.bound_identity(&session), Some(id.clone()));
/// assert!(store.is_currently_authenticated(&id));
/// ```
#[derive(Debug)]
pub struct AuthStateStore {
    state: Mutex<StoreState>,
    auth_window: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for AuthStateStore {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_AUTH_WINDOW_MINUTES))
    }
}

impl AuthStateStore {
    /// Creates an empty store using the wall clock.
    pub fn new(auth_window: Duration) -> Self {
        Self::with_clock(auth_window, Arc::new(SystemClock))
    }

    /// Creates an empty store driven by the given clock.
    pub fn with_clock(auth_window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            auth_window,
            clock,
        }
    }

    /// The validity duration of a login.
    pub fn auth_window(&self) -> Duration {
        self.auth_window
    }

    // Every update is a single map operation, so a poisoned guard still
    // holds consistent maps.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Marks `identity` as authenticated now, replacing any earlier login.
    pub fn record_login(&self, identity: &Identity) {
        let now = self.clock.now();
        self.lock().records.insert(identity.clone(), now);
        tracing::debug!(identity = %identity, at = %now, "Recorded login");
    }

    /// Binds `session` to `identity` unless it is already bound elsewhere.
    ///
    /// Bindings are sticky: a session bound to one identity is never
    /// reassigned. Binding the same pair again is a no-op.
    pub fn bind_session(&self, session: &SessionId, identity: &Identity) -> BindOutcome {
        let outcome = self.lock().bind(session, identity);
        match &outcome {
            BindOutcome::Created => {
                tracing::debug!(session = %session, identity = %identity, "Bound session")
            }
            BindOutcome::Unchanged => {}
            BindOutcome::Conflict { existing } => tracing::warn!(
                session = %session,
                requested = %identity,
                existing = %existing,
                "Refused to rebind session to a different identity"
            ),
        }
        outcome
    }

    /// Returns the identity bound to `session`, if any.
    pub fn bound_identity(&self, session: &SessionId) -> Option<Identity> {
        self.lock().bindings.get(session).cloned()
    }

    /// Returns the stored login record for `identity`, fresh or stale.
    pub fn auth_record(&self, identity: &Identity) -> Option<AuthRecord> {
        self.lock().records.get(identity).map(|at| AuthRecord {
            identity: identity.clone(),
            last_authenticated_at: *at,
        })
    }

    /// Whether `identity` logged in less than one auth window ago.
    pub fn is_currently_authenticated(&self, identity: &Identity) -> bool {
        let now = self.clock.now();
        self.lock().is_fresh(identity, now, self.auth_window)
    }

    /// Returns some identity that is currently authenticated.
    ///
    /// When several qualify, the most recently authenticated one is chosen;
    /// identical timestamps are broken by the smallest identity.
    pub fn find_any_currently_authenticated(&self) -> Option<Identity> {
        let now = self.clock.now();
        self.lock().most_recent_fresh(now, self.auth_window)
    }

    /// Counts bindings and records for diagnostics.
    pub fn snapshot(&self) -> StoreSnapshot {
        let now = self.clock.now();
        let state = self.lock();
        StoreSnapshot {
            bound_sessions: state.bindings.len(),
            known_identities: state.records.len(),
            authenticated_identities: state
                .records
                .values()
                .filter(|at| now.signed_duration_since(**at) < self.auth_window)
                .count(),
        }
    }

    /// Runs `f` against a consistent view of the store under one lock.
    ///
    /// Used by the resolver so that the lookup, the fallback search, and the
    /// memoizing bind observe and mutate the same state.
    pub(crate) fn transaction<T>(&self, f: impl FnOnce(&mut StoreTxn<'_>) -> T) -> T {
        let now = self.clock.now();
        let mut guard = self.lock();
        let mut txn = StoreTxn {
            state: &mut *guard,
            now,
            window: self.auth_window,
        };
        f(&mut txn)
    }
}

/// A locked view of the store for a single resolution.
pub(crate) struct StoreTxn<'a> {
    state: &'a mut StoreState,
    now: DateTime<Utc>,
    window: Duration,
}

impl StoreTxn<'_> {
    pub(crate) fn bound_identity(&self, session: &SessionId) -> Option<Identity> {
        self.state.bindings.get(session).cloned()
    }

    pub(crate) fn is_currently_authenticated(&self, identity: &Identity) -> bool {
        self.state.is_fresh(identity, self.now, self.window)
    }

    pub(crate) fn find_any_currently_authenticated(&self) -> Option<Identity> {
        self.state.most_recent_fresh(self.now, self.window)
    }

    pub(crate) fn bind_session(&mut self, session: &SessionId, identity: &Identity) -> BindOutcome {
        self.state.bind(session, identity)
    }
}
