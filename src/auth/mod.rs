//! Session-to-identity authentication state
//!
//! Every tool call arrives with a transport-assigned session identifier.
//! This module decides which identity (a phone number) that call is
//! attributed to, and whether the identity's last login is still fresh.
//!
//! # Module Layout
//!
//! - [`clock`]    -- injectable time source for the auth window predicate
//! - [`store`]    -- session bindings and per-identity login records
//! - [`resolver`] -- session resolution with bound-session and fallback policy

pub mod clock;
pub mod resolver;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use clock::{Clock, ManualClock, SystemClock};
pub use resolver::{AuthorizationResolver, BoundSessionPolicy, Resolution};
pub use store::{
    AuthRecord, AuthStateStore, BindOutcome, StoreSnapshot, DEFAULT_AUTH_WINDOW_MINUTES,
};

/// An authenticated user, identified by phone number.
///
/// # Examples
///
/// ```
/// use toolgate::auth::Identity;
///
/// let id = Identity::from("+15550001111");
/// assert_eq!(id.as_str(), "+15550001111");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the phone number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque per-connection identifier minted by the transport.
///
/// # Examples
///
/// ```
/// use toolgate::auth::SessionId;
///
/// let a = SessionId::generate();
/// let b = SessionId::generate();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an existing session identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints a fresh random session identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
