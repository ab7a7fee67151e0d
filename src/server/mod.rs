//! HTTP server
//!
//! Mounts the MCP endpoint, the login web flow, and a health check on one
//! axum router sharing a single [`AppState`].

pub mod web;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::allowlist::{IdentityAllowlist, StaticAllowlist};
use crate::auth::{AuthStateStore, AuthorizationResolver, SessionId, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::gate::Gate;
use crate::login::{LoginNotifier, LoginUrlBuilder, LOGIN_PAGE_PATH};
use crate::mcp::handler::{McpHandler, McpReply};
use crate::mcp::types::{Implementation, SESSION_HEADER};
use crate::mcp::ToolCatalog;
use crate::provider::{DataProvider, FileDataProvider};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// JSON-RPC dispatcher for `/mcp`.
    pub mcp: Arc<McpHandler>,
    /// Applies completed logins from the web flow.
    pub notifier: Arc<LoginNotifier>,
    /// The store both of the above share.
    pub store: Arc<AuthStateStore>,
}

impl AppState {
    /// Wires the default collaborators described by `config`.
    ///
    /// The allowlist comes from `data.allowed_identities`, or from the data
    /// directory's subdirectories when that list is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the allowlist has to be discovered and the data
    /// directory cannot be read.
    pub fn from_config(config: &Config) -> Result<Self> {
        let allowlist: Arc<dyn IdentityAllowlist> = if config.data.allowed_identities.is_empty() {
            Arc::new(StaticAllowlist::from_data_dir(&config.data.dir)?)
        } else {
            Arc::new(StaticAllowlist::new(
                config.data.allowed_identities.iter().cloned(),
            ))
        };

        let provider: Arc<dyn DataProvider> = Arc::new(FileDataProvider::new(&config.data.dir));
        Ok(Self::with_parts(config, allowlist, provider))
    }

    /// Wires the state around caller-supplied allowlist and provider.
    pub fn with_parts(
        config: &Config,
        allowlist: Arc<dyn IdentityAllowlist>,
        provider: Arc<dyn DataProvider>,
    ) -> Self {
        let store = Arc::new(AuthStateStore::with_clock(
            config.auth.window(),
            Arc::new(SystemClock),
        ));
        Self::with_store(config, store, allowlist, provider)
    }

    /// Wires the state around an existing store.
    pub fn with_store(
        config: &Config,
        store: Arc<AuthStateStore>,
        allowlist: Arc<dyn IdentityAllowlist>,
        provider: Arc<dyn DataProvider>,
    ) -> Self {
        let resolver =
            AuthorizationResolver::with_policy(store.clone(), config.auth.bound_session_policy);
        let login_urls = LoginUrlBuilder::new(&config.server.public_host, config.server.port);
        let gate = Gate::new(resolver, allowlist.clone(), provider, login_urls);

        let server_info = Implementation {
            name: config.server.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let mcp = McpHandler::new(
            Arc::new(gate),
            ToolCatalog::from_definitions(&config.tools),
            server_info,
        );

        Self {
            mcp: Arc::new(mcp),
            notifier: Arc::new(LoginNotifier::new(store.clone(), allowlist)),
            store,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(mcp_endpoint))
        .route(LOGIN_PAGE_PATH, get(web::login_page))
        .route("/login", post(web::submit_login))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the state cannot be built, the address is invalid, or
/// the listener cannot be bound.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.bind_address, config.server.port
            )
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        %addr,
        window_minutes = config.auth.window_minutes,
        policy = ?config.auth.bound_session_policy,
        tools = config.tools.len(),
        "Toolgate listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down server");
        })
        .await?;

    Ok(())
}

async fn mcp_endpoint(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let session = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(SessionId::from);

    match state.mcp.handle_message(session, &body).await {
        McpReply::Accepted => StatusCode::ACCEPTED.into_response(),
        McpReply::Response {
            response,
            new_session,
        } => {
            let mut headers = HeaderMap::new();
            if let Some(session) = new_session {
                match HeaderValue::from_str(session.as_str()) {
                    Ok(value) => {
                        headers.insert(SESSION_HEADER, value);
                    }
                    Err(e) => tracing::error!("Session id is not a valid header value: {}", e),
                }
            }
            (StatusCode::OK, headers, Json(response)).into_response()
        }
    }
}
