//! Session resolution
//!
//! Turns a session identifier into the identity a tool call is attributed
//! to. Resolution is two-tier:
//!
//! 1. A session already bound to an identity resolves to it ([`Resolution::Bound`]).
//! 2. An unbound session borrows the identity of the most recent fresh login
//!    and is bound to it on the spot ([`Resolution::FallbackBound`]).
//!
//! The fallback exists because the transport may mint a new session per
//! connection even for a user who just logged in on a previous one. It is a
//! usability shortcut for single-user deployments, not a security boundary.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::store::{AuthStateStore, BindOutcome};
use super::{Identity, SessionId};

/// Whether a bound session must still be inside the auth window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundSessionPolicy {
    /// A bound session is authorized only while its identity's login is fresh.
    #[default]
    Revalidate,
    /// A bound session stays authorized indefinitely once bound.
    Sticky,
}

impl std::str::FromStr for BoundSessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "revalidate" => Ok(Self::Revalidate),
            "sticky" => Ok(Self::Sticky),
            other => Err(format!("unknown bound session policy: {}", other)),
        }
    }
}

/// Who a call is attributed to, and how that was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The session was already bound to this identity.
    Bound(Identity),
    /// The session was unbound and has just been bound to a fresh login.
    FallbackBound(Identity),
    /// No identity can be attributed; the caller must log in.
    Unauthenticated,
}

impl Resolution {
    /// The attributed identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Resolution::Bound(id) | Resolution::FallbackBound(id) => Some(id),
            Resolution::Unauthenticated => None,
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Bound(_) => "bound",
            Resolution::FallbackBound(_) => "fallback_bound",
            Resolution::Unauthenticated => "unauthenticated",
        }
    }
}

/// Resolves sessions against a shared [`AuthStateStore`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use toolgate::auth::{AuthStateStore, AuthorizationResolver, Identity, Resolution, SessionId};
///
/// let store = Arc::new(AuthStateStore::default());
/// let resolver = AuthorizationResolver::new(store.clone());
///
/// assert_eq!(resolver.resolve(&SessionId::from("s1")), Resolution::Unauthenticated);
///
/// store.record_login(&Identity::from("+1555"));
/// assert_eq!(
///     resolver.resolve(&SessionId::from("s1")),
///     Resolution::FallbackBound(Identity::from("+1555"))
/// );
/// assert_eq!(
///     resolver.resolve(&SessionId::from("s1")),
///     Resolution::Bound(Identity::from("+1555"))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationResolver {
    store: Arc<AuthStateStore>,
    policy: BoundSessionPolicy,
}

impl AuthorizationResolver {
    /// Creates a resolver with the default [`BoundSessionPolicy::Revalidate`].
    pub fn new(store: Arc<AuthStateStore>) -> Self {
        Self::with_policy(store, BoundSessionPolicy::default())
    }

    /// Creates a resolver with an explicit bound-session policy.
    pub fn with_policy(store: Arc<AuthStateStore>, policy: BoundSessionPolicy) -> Self {
        Self { store, policy }
    }

    /// The store this resolver reads and writes.
    pub fn store(&self) -> &Arc<AuthStateStore> {
        &self.store
    }

    /// Attributes `session` to an identity.
    ///
    /// The lookup, the fallback search, and the memoizing bind happen under
    /// a single store lock, so two concurrent calls for the same unbound
    /// session cannot bind it to different identities.
    pub fn resolve(&self, session: &SessionId) -> Resolution {
        let policy = self.policy;
        let resolution = self.store.transaction(|txn| {
            if let Some(identity) = txn.bound_identity(session) {
                return match policy {
                    BoundSessionPolicy::Sticky => Resolution::Bound(identity),
                    BoundSessionPolicy::Revalidate if txn.is_currently_authenticated(&identity) => {
                        Resolution::Bound(identity)
                    }
                    BoundSessionPolicy::Revalidate => {
                        tracing::debug!(
                            session = %session,
                            identity = %identity,
                            "Bound session's login has expired"
                        );
                        Resolution::Unauthenticated
                    }
                };
            }

            match txn.find_any_currently_authenticated() {
                Some(identity) => match txn.bind_session(session, &identity) {
                    BindOutcome::Created | BindOutcome::Unchanged => {
                        Resolution::FallbackBound(identity)
                    }
                    // Unreachable while the lock is held: the session was unbound above.
                    BindOutcome::Conflict { existing } => Resolution::Bound(existing),
                },
                None => Resolution::Unauthenticated,
            }
        });

        tracing::debug!(
            session = %session,
            outcome = resolution.label(),
            identity = resolution.identity().map(Identity::as_str).unwrap_or(""),
            "Resolved session"
        );
        resolution
    }
}
