//! Shared helpers for unit tests: in-process upstream servers and test tokens.

use std::time::Duration;

use axum::Router;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use crate::config::Config;

/// Raw HMAC secret behind [`TEST_JWK_SECRET_B64`]
pub const TEST_SECRET: &[u8] = b"weather-mcp-test-signing-secret!";

/// Base64url form of [`TEST_SECRET`] as it appears in a JWK `k` member
pub const TEST_JWK_SECRET_B64: &str = "d2VhdGhlci1tY3AtdGVzdC1zaWduaW5nLXNlY3JldCE";

/// Key id of the test signing key
pub const TEST_KID: &str = "test-key";

pub const TEST_ISSUER: &str = "https://idp.test/";
pub const TEST_AUDIENCE: &str = "https://mcp.test/mcp";

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// JWKS document containing the test signing key
pub fn test_jwks() -> Value {
    json!({
        "keys": [{
            "kty": "oct",
            "kid": TEST_KID,
            "alg": "HS256",
            "k": TEST_JWK_SECRET_B64
        }]
    })
}

/// Claims accepted by a verifier configured with [`test_config`]
pub fn valid_claims() -> Value {
    json!({
        "sub": "auth0|alex",
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "exp": 4_102_444_800u64,
        "scope": "openid profile"
    })
}

/// Sign `claims` with the test key under `kid`
pub fn mint_token(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(TEST_SECRET)).unwrap()
}

/// Configuration pointing every upstream at `upstream`
pub fn test_config(upstream: &str) -> Config {
    let mut config = Config::defaults();
    config.base_url = "https://mcp.test".to_string();
    config.authorization_server = upstream.to_string();
    config.issuer = TEST_ISSUER.to_string();
    config.audience = TEST_AUDIENCE.to_string();
    config.jwks_uri = format!("{}/.well-known/jwks.json", upstream);
    config.weather_api_base = upstream.to_string();
    config.request_timeout = Duration::from_secs(5);
    config
}
