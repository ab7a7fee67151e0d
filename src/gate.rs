//! Tool-call gate
//!
//! Wraps every tool invocation:
//!
//! 1. resolve the call's session to an identity;
//! 2. if none, answer with a login-required payload (a normal result, not an error);
//! 3. if the identity is not allowlisted, answer with an error result;
//! 4. otherwise hand an [`AuthorizedCall`] to the data provider and return its
//!    payload verbatim, or a generic error result if it fails.
//!
//! [`Gate::handle`] never fails: every branch produces a [`CallToolResponse`].

use std::sync::Arc;
use std::time::Instant;

use metrics::{histogram, increment_counter};

use crate::allowlist::IdentityAllowlist;
use crate::auth::{AuthorizationResolver, Identity, Resolution, SessionId};
use crate::login::{LoginRequired, LoginUrlBuilder};
use crate::mcp::types::{CallToolParams, CallToolResponse, ToolResponseContent};
use crate::provider::DataProvider;

/// Error text returned when the resolved identity is not allowlisted.
pub const NOT_ALLOWED_MESSAGE: &str = "phone number is not allowed";

/// Error text returned when the data provider fails.
pub const READ_FAILURE_MESSAGE: &str = "error reading test data file";

/// Request-scoped data the transport extracts before calling the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// The session the call arrived on.
    pub session: SessionId,
}

impl CallContext {
    /// Creates a context for `session`.
    pub fn new(session: SessionId) -> Self {
        Self { session }
    }
}

/// A tool call that has passed the gate, carrying its attributed identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedCall {
    /// Session the call arrived on.
    pub session: SessionId,
    /// Identity the call is attributed to.
    pub identity: Identity,
    /// Name of the invoked tool.
    pub tool_name: String,
    /// Arguments supplied by the caller.
    pub arguments: Option<serde_json::Value>,
}

/// How a call left the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No identity could be attributed; a login URL was returned.
    LoginRequired,
    /// The identity is not on the allowlist.
    IdentityNotAllowed,
    /// The data provider failed.
    DataUnavailable,
    /// The provider's payload was returned.
    Served,
}

impl GateOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            GateOutcome::LoginRequired => "login_required",
            GateOutcome::IdentityNotAllowed => "identity_not_allowed",
            GateOutcome::DataUnavailable => "data_unavailable",
            GateOutcome::Served => "served",
        }
    }
}

/// Request interceptor in front of the data provider.
pub struct Gate {
    resolver: AuthorizationResolver,
    allowlist: Arc<dyn IdentityAllowlist>,
    provider: Arc<dyn DataProvider>,
    login_urls: LoginUrlBuilder,
}

impl Gate {
    /// Assembles a gate from its collaborators.
    pub fn new(
        resolver: AuthorizationResolver,
        allowlist: Arc<dyn IdentityAllowlist>,
        provider: Arc<dyn DataProvider>,
        login_urls: LoginUrlBuilder,
    ) -> Self {
        Self {
            resolver,
            allowlist,
            provider,
            login_urls,
        }
    }

    /// Runs one tool call through the gate.
    pub async fn handle(&self, ctx: &CallContext, params: CallToolParams) -> CallToolResponse {
        let (outcome, response) = self.evaluate(ctx, params).await;
        increment_counter!("gate_calls_total", "outcome" => outcome.label());
        response
    }

    /// Runs one tool call and also reports which branch it took.
    pub async fn evaluate(
        &self,
        ctx: &CallContext,
        params: CallToolParams,
    ) -> (GateOutcome, CallToolResponse) {
        let identity = match self.resolver.resolve(&ctx.session) {
            Resolution::Unauthenticated => {
                let login_url = self.login_urls.login_url(&ctx.session);
                // An expired bound session can only be revived by its own identity.
                let payload = match self.resolver.store().bound_identity(&ctx.session) {
                    Some(bound) => {
                        tracing::info!(
                            session = %ctx.session,
                            identity = %bound,
                            tool = %params.name,
                            "Login expired for bound session"
                        );
                        LoginRequired::for_identity(login_url, &bound)
                    }
                    None => {
                        tracing::info!(
                            session = %ctx.session,
                            tool = %params.name,
                            "Login required"
                        );
                        LoginRequired::new(login_url)
                    }
                };
                return (GateOutcome::LoginRequired, payload.into_tool_response());
            }
            Resolution::Bound(identity) | Resolution::FallbackBound(identity) => identity,
        };

        if !self.allowlist.contains(&identity) {
            tracing::warn!(session = %ctx.session, identity = %identity, "Identity not allowed");
            return (
                GateOutcome::IdentityNotAllowed,
                error_response(NOT_ALLOWED_MESSAGE),
            );
        }

        let call = AuthorizedCall {
            session: ctx.session.clone(),
            identity,
            tool_name: params.name,
            arguments: params.arguments,
        };

        let started = Instant::now();
        let result = self.provider.fetch(&call).await;
        histogram!(
            "data_provider_duration_seconds",
            started.elapsed().as_secs_f64(),
            "tool" => call.tool_name.clone()
        );

        match result {
            Ok(payload) => {
                tracing::debug!(
                    identity = %call.identity,
                    tool = %call.tool_name,
                    bytes = payload.len(),
                    "Served tool call"
                );
                (GateOutcome::Served, text_response(payload))
            }
            Err(e) => {
                tracing::error!(
                    identity = %call.identity,
                    tool = %call.tool_name,
                    "Data provider failed: {:#}",
                    e
                );
                (
                    GateOutcome::DataUnavailable,
                    error_response(READ_FAILURE_MESSAGE),
                )
            }
        }
    }
}

fn text_response(text: String) -> CallToolResponse {
    CallToolResponse {
        content: vec![ToolResponseContent::Text { text }],
        is_error: None,
        meta: None,
        structured_content: None,
    }
}

fn error_response(message: &str) -> CallToolResponse {
    CallToolResponse {
        content: vec![ToolResponseContent::Text {
            text: message.to_string(),
        }],
        is_error: Some(true),
        meta: None,
        structured_content: None,
    }
}
