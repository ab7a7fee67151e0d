//! Login flow glue
//!
//! - [`LoginUrlBuilder`] computes the out-of-band login page URL for a session.
//! - [`LoginRequired`] is the structured payload returned to an
//!   unauthenticated caller.
//! - [`LoginNotifier`] is invoked when a user completes the web login; it
//!   records the login and binds the session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::allowlist::IdentityAllowlist;
use crate::auth::{AuthStateStore, BindOutcome, Identity, SessionId};
use crate::error::ToolgateError;
use crate::mcp::types::{CallToolResponse, ToolResponseContent};

/// Value of the `status` field in a login-required payload.
pub const LOGIN_REQUIRED_STATUS: &str = "login_required";

/// Instructions returned with every login-required payload.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Needs to login first by going to the login url.\nShow the login url as clickable link if client supports it. Otherwise display the URL for users to copy and paste into a browser. \nAsk users to come back and let you know once they are done with login in their browser";

/// Path of the mock login page served by the web flow.
pub const LOGIN_PAGE_PATH: &str = "/mockWebPage";

/// Builds `http://<host>:<port>/mockWebPage?sessionId=<session>`.
///
/// The session identifier is inserted verbatim.
///
/// # Examples
///
/// ```
/// use toolgate::auth::SessionId;
/// use toolgate::login::LoginUrlBuilder;
///
/// let urls = LoginUrlBuilder::new("localhost", 8080);
/// assert_eq!(
///     urls.login_url(&SessionId::from("abc")),
///     "http://localhost:8080/mockWebPage?sessionId=abc"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUrlBuilder {
    host: String,
    port: u16,
}

impl LoginUrlBuilder {
    /// Creates a builder for the given public host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The login URL for `session`.
    pub fn login_url(&self, session: &SessionId) -> String {
        format!(
            "http://{}:{}{}?sessionId={}",
            self.host, self.port, LOGIN_PAGE_PATH, session
        )
    }
}

/// Payload telling the calling agent that the user must log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequired {
    /// Always [`LOGIN_REQUIRED_STATUS`].
    pub status: String,
    /// Where the user should go to log in.
    pub login_url: String,
    /// Instructions for the agent.
    pub message: String,
    /// The identity the session is already bound to, when its login expired.
    ///
    /// Such a session can only be re-authorized by that identity logging in
    /// again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl LoginRequired {
    /// Builds the payload for a given login URL.
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            status: LOGIN_REQUIRED_STATUS.to_string(),
            login_url: login_url.into(),
            message: LOGIN_REQUIRED_MESSAGE.to_string(),
            identity: None,
        }
    }

    /// Builds the payload for a session already bound to `identity`.
    pub fn for_identity(login_url: impl Into<String>, identity: &Identity) -> Self {
        Self {
            identity: Some(identity.to_string()),
            ..Self::new(login_url)
        }
    }

    /// Renders the payload as a successful tool result.
    ///
    /// The JSON is carried as text content and mirrored in
    /// `structuredContent`; the result is never flagged as an error.
    pub fn into_tool_response(self) -> CallToolResponse {
        let structured = serde_json::to_value(&self).ok();
        let text = structured
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("{{\"status\":\"{}\"}}", LOGIN_REQUIRED_STATUS));
        CallToolResponse {
            content: vec![ToolResponseContent::Text { text }],
            is_error: None,
            meta: None,
            structured_content: structured,
        }
    }
}

/// What a completed login did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCompletion {
    /// The identity that logged in.
    pub identity: Identity,
    /// The session it was bound to.
    pub session: SessionId,
    /// Whether the binding was new.
    pub newly_bound: bool,
}

/// Applies out-of-band login completions to the auth store.
pub struct LoginNotifier {
    store: Arc<AuthStateStore>,
    allowlist: Arc<dyn IdentityAllowlist>,
}

impl LoginNotifier {
    /// Creates a notifier writing to `store` and vetting against `allowlist`.
    pub fn new(store: Arc<AuthStateStore>, allowlist: Arc<dyn IdentityAllowlist>) -> Self {
        Self { store, allowlist }
    }

    /// Identities offered on the login page.
    pub fn allowed_identities(&self) -> Vec<Identity> {
        self.allowlist.identities()
    }

    /// Identities offered on `session`'s login page.
    ///
    /// A bound session only accepts a login from its bound identity, so the
    /// page offers just that one while it is still allowlisted.
    pub fn allowed_identities_for(&self, session: &SessionId) -> Vec<Identity> {
        match self.store.bound_identity(session) {
            Some(bound) if self.allowlist.contains(&bound) => vec![bound],
            _ => self.allowed_identities(),
        }
    }

    /// Records that `identity` completed login from `session`'s login page.
    ///
    /// The login is recorded before the bind, so even a refused bind leaves
    /// the identity authenticated for fallback resolution on new sessions.
    ///
    /// # Errors
    ///
    /// - [`ToolgateError::IdentityNotAllowed`] if the identity is not permitted;
    ///   nothing is recorded.
    /// - [`ToolgateError::SessionConflict`] if the session is already bound to
    ///   another identity.
    pub fn complete_login(
        &self,
        session: &SessionId,
        identity: &Identity,
    ) -> Result<LoginCompletion, ToolgateError> {
        if !self.allowlist.contains(identity) {
            metrics::increment_counter!("logins_total", "result" => "not_allowed");
            tracing::warn!(session = %session, identity = %identity, "Login rejected: identity not allowed");
            return Err(ToolgateError::IdentityNotAllowed(identity.to_string()));
        }

        self.store.record_login(identity);

        match self.store.bind_session(session, identity) {
            BindOutcome::Conflict { existing } => {
                metrics::increment_counter!("logins_total", "result" => "conflict");
                Err(ToolgateError::SessionConflict {
                    session: session.to_string(),
                    existing: existing.to_string(),
                })
            }
            outcome => {
                metrics::increment_counter!("logins_total", "result" => "ok");
                tracing::info!(session = %session, identity = %identity, "Login completed");
                Ok(LoginCompletion {
                    identity: identity.clone(),
                    session: session.clone(),
                    newly_bound: outcome == BindOutcome::Created,
                })
            }
        }
    }
}
