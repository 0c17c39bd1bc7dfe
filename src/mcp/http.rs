//! HTTP transport
//!
//! Serves the MCP endpoint behind the bearer gate, plus the unauthenticated
//! OAuth discovery routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;

use crate::auth::metadata::{DiscoveryDocument, DiscoveryForwarder, ProtectedResourceMetadata};
use crate::auth::middleware::{require_bearer, AuthState};
use crate::auth::verifier::{TokenClaims, TokenVerifier};
use crate::config::{Config, MCP_PATH};
use crate::error::Result;
use crate::mcp::server::McpServer;
use crate::mcp::tools::ToolContext;

/// Shared state of the HTTP routes
#[derive(Clone)]
pub struct AppState {
    /// JSON-RPC dispatcher
    pub server: Arc<McpServer>,

    /// Identity provider discovery forwarder
    pub forwarder: Arc<DiscoveryForwarder>,

    /// Locally served protected-resource metadata
    pub resource_metadata: Arc<ProtectedResourceMetadata>,
}

impl AppState {
    /// Build the state for `config`
    pub fn new(config: &Config) -> Self {
        Self {
            server: Arc::new(McpServer::new(config)),
            forwarder: Arc::new(DiscoveryForwarder::new(config)),
            resource_metadata: Arc::new(ProtectedResourceMetadata::from_config(config)),
        }
    }
}

/// Build the full application router
pub fn router(config: &Config, state: AppState, verifier: Arc<dyn TokenVerifier>) -> Router {
    let auth = AuthState {
        verifier,
        resource_metadata_url: format!(
            "{}{}",
            config.base_url,
            ProtectedResourceMetadata::well_known_path()
        ),
    };

    let mcp = Router::new()
        .route(MCP_PATH, post(handle_mcp).get(method_not_allowed))
        .route_layer(middleware::from_fn_with_state(auth, require_bearer));

    let resource_path = ProtectedResourceMetadata::well_known_path();

    Router::new()
        .merge(mcp)
        .route(resource_path, get(protected_resource_metadata))
        .route(
            &format!("{}{}", resource_path, MCP_PATH),
            get(protected_resource_metadata),
        )
        .route(
            DiscoveryDocument::AuthorizationServer.well_known_path(),
            get(authorization_server_metadata),
        )
        .route(
            DiscoveryDocument::OpenIdConfiguration.well_known_path(),
            get(openid_configuration),
        )
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &Config, verifier: Arc<dyn TokenVerifier>) -> Result<()> {
    let app = router(config, AppState::new(config), verifier);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        issuer = %config.issuer,
        "Weather MCP server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Weather MCP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

async fn handle_mcp(
    State(state): State<AppState>,
    claims: Option<Extension<TokenClaims>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let ctx = ToolContext {
        headers,
        claims: claims.map(|Extension(c)| c),
    };

    match state.server.handle_message(&body, &ctx).await {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error handling message");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "jsonrpc": "2.0",
                    "error": {"code": -32603, "message": e.to_string()},
                    "id": null
                })),
            )
                .into_response()
        }
    }
}

async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

async fn protected_resource_metadata(State(state): State<AppState>) -> Json<ProtectedResourceMetadata> {
    Json(state.resource_metadata.as_ref().clone())
}

async fn authorization_server_metadata(State(state): State<AppState>) -> Response {
    forward_discovery(&state, DiscoveryDocument::AuthorizationServer).await
}

async fn openid_configuration(State(state): State<AppState>) -> Response {
    forward_discovery(&state, DiscoveryDocument::OpenIdConfiguration).await
}

async fn forward_discovery(state: &AppState, document: DiscoveryDocument) -> Response {
    match state.forwarder.forward(document).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Discovery forwarding failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "bad_gateway",
                    "error_description": e.to_string()
                })),
            )
                .into_response()
        }
    }
}
