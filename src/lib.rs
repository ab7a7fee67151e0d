//! Toolgate - session authentication gate for MCP tool servers
//!
//! Every tool call on the MCP endpoint is attributed to an identity before it
//! reaches a data provider. Identities are established out of band through a
//! web login; a session without one receives a login URL instead of data.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: auth state store, clock, and the session-to-identity resolver
//! - `allowlist`: which identities may be served
//! - `gate`: the tool-call interceptor
//! - `provider`: data providers producing tool payloads
//! - `login`: login URLs, the login-required payload, and the login notifier
//! - `mcp`: JSON-RPC wire types, tool catalog, and method dispatch
//! - `server`: axum router for the MCP endpoint and login web flow
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use toolgate::{Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!     server::serve(&config).await
//! }
//! ```

pub mod allowlist;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod logging;
pub mod login;
pub mod mcp;
pub mod provider;
pub mod server;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{AuthStateStore, AuthorizationResolver, Identity, Resolution, SessionId};
pub use config::Config;
pub use error::{Result, ToolgateError};
pub use gate::{AuthorizedCall, Gate};

#[cfg(test)]
pub mod test_utils;
