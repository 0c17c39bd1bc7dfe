//! Bearer token gate for the MCP endpoint
//!
//! Requests without a valid `Authorization: Bearer` token are answered with
//! 401 and a `WWW-Authenticate` header pointing at the protected-resource
//! metadata. Verified claims are stored in the request extensions.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::verifier::TokenVerifier;
use crate::error::AuthError;

/// State for [`require_bearer`]
#[derive(Clone)]
pub struct AuthState {
    /// Token verifier
    pub verifier: Arc<dyn TokenVerifier>,

    /// Absolute URL of the protected-resource metadata document
    pub resource_metadata_url: String,
}

/// Middleware rejecting requests that do not carry a verified bearer token
pub async fn require_bearer(State(auth): State<AuthState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    let Some(token) = token else {
        return auth_error_response(&AuthError::MissingCredential, &auth.resource_metadata_url);
    };

    match auth.verifier.verify(&token).await {
        Ok(claims) => {
            tracing::debug!(sub = ?claims.sub, "Bearer token verified");
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Bearer token rejected");
            auth_error_response(&e, &auth.resource_metadata_url)
        }
    }
}

/// Extract the token from an `Authorization` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Build the 401 response for an authentication failure
pub fn auth_error_response(error: &AuthError, resource_metadata_url: &str) -> Response {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "error": {
            "code": -32001,
            "message": error.to_string()
        },
        "id": null
    });

    let mut response = (error.status_code(), Json(body)).into_response();
    let challenge = HeaderValue::from_str(&error.www_authenticate(Some(resource_metadata_url)))
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer"));
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, challenge);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verifier::TokenClaims;
    use async_trait::async_trait;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Extension, Router};
    use tower::ServiceExt;

    /// Accepts exactly one token
    struct FixedVerifier;

    #[async_trait]
    impl TokenVerifier for FixedVerifier {
        async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
            if token == "good" {
                Ok(serde_json::from_value(serde_json::json!({"sub": "user-1"})).unwrap())
            } else {
                Err(AuthError::InvalidToken {
                    description: "signature mismatch".to_string(),
                })
            }
        }
    }

    fn app() -> Router {
        let auth = AuthState {
            verifier: Arc::new(FixedVerifier),
            resource_metadata_url: "https://mcp.test/.well-known/oauth-protected-resource"
                .to_string(),
        };
        Router::new()
            .route(
                "/mcp",
                post(|Extension(claims): Extension<TokenClaims>| async move {
                    claims.sub.unwrap_or_default()
                }),
            )
            .route_layer(middleware::from_fn_with_state(auth, require_bearer))
    }

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/mcp");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[tokio::test]
    async fn test_missing_token_returns_401() {
        let resp = app().oneshot(request(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers()[header::WWW_AUTHENTICATE],
            "Bearer resource_metadata=\"https://mcp.test/.well-known/oauth-protected-resource\""
        );
    }

    #[tokio::test]
    async fn test_invalid_token_returns_401() {
        let resp = app().oneshot(request(Some("Bearer bad"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let challenge = resp.headers()[header::WWW_AUTHENTICATE].to_str().unwrap();
        assert!(challenge.contains("error=\"invalid_token\""));
    }

    #[tokio::test]
    async fn test_every_auth_error_is_401() {
        let url = "https://mcp.test/.well-known/oauth-protected-resource";
        for error in [
            AuthError::MissingCredential,
            AuthError::ExpiredToken,
            AuthError::InvalidAudience,
            AuthError::UnknownSigningKey {
                kid: "k".to_string(),
            },
            AuthError::KeySetUnavailable {
                message: "down".to_string(),
            },
        ] {
            let resp = auth_error_response(&error, url);
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body["error"]["code"], -32001);
        }
    }

    #[tokio::test]
    async fn test_valid_token_passes_claims() {
        let resp = app().oneshot(request(Some("Bearer good"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"user-1");
    }
}
