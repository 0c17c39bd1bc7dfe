//! Bearer token verification
//!
//! [`TokenVerifier`] is the seam the HTTP layer depends on; [`JwksVerifier`]
//! checks JWTs against the identity provider's published key set.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AuthError;

/// Minimum time between key set fetches triggered by unknown key ids
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Audience claim, a single string or an array of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenAudience {
    Single(String),
    Multiple(Vec<String>),
}

/// Claims of a verified access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<TokenAudience>,

    /// Expiry (Unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Space-delimited scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Everything else
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Verifies a bearer token and returns its claims
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// JWT verifier backed by a remote JWKS document
pub struct JwksVerifier {
    /// HTTP client
    http_client: reqwest::Client,

    /// Key set location
    jwks_uri: String,

    /// Expected `iss`
    issuer: String,

    /// Expected `aud`
    audience: String,

    /// Accepted signing algorithms
    algorithms: Vec<Algorithm>,

    /// Timeout for key set retrieval
    timeout: Duration,

    /// Minimum time between refetches
    min_refetch_interval: Duration,

    /// Last fetched key set
    keys: RwLock<Option<CachedKeys>>,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

impl JwksVerifier {
    /// Create a verifier for the identity provider in `config`, accepting RS256
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            jwks_uri: config.jwks_uri.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            algorithms: vec![Algorithm::RS256],
            timeout: config.request_timeout,
            min_refetch_interval: MIN_REFETCH_INTERVAL,
            keys: RwLock::new(None),
        }
    }

    /// Replace the minimum time between key set refetches
    pub fn min_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }

    /// Replace the accepted signing algorithms
    pub fn algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    async fn fetch_key_set(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(jwks_uri = %self.jwks_uri, "Fetching signing key set");

        let unavailable = |e: reqwest::Error| AuthError::KeySetUnavailable {
            message: e.to_string(),
        };

        self.http_client
            .get(&self.jwks_uri)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json::<JwkSet>()
            .await
            .map_err(unavailable)
    }

    /// Look up the key for `kid`, refetching the key set once if it is not cached.
    ///
    /// Refetches are skipped while the cached set is younger than the minimum
    /// refetch interval, so unknown key ids cannot force a fetch per request.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let unknown = || AuthError::UnknownSigningKey {
            kid: kid.to_string(),
        };

        {
            let cached = self.keys.read().await;
            if let Some(cached) = cached.as_ref() {
                if let Some(jwk) = cached.set.find(kid) {
                    return key_from_jwk(jwk);
                }
                if cached.fetched_at.elapsed() < self.min_refetch_interval {
                    tracing::debug!(kid = %kid, "Unknown key id, key set fetched too recently");
                    return Err(unknown());
                }
            }
        }

        let mut cached = self.keys.write().await;
        // Another request may have refreshed the set while we waited
        if let Some(current) = cached.as_ref() {
            if let Some(jwk) = current.set.find(kid) {
                return key_from_jwk(jwk);
            }
            if current.fetched_at.elapsed() < self.min_refetch_interval {
                return Err(unknown());
            }
        }

        let set = self.fetch_key_set().await?;
        let key = match set.find(kid) {
            Some(jwk) => key_from_jwk(jwk),
            None => Err(unknown()),
        };
        *cached = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });
        key
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let header = jsonwebtoken::decode_header(token).map_err(|e| AuthError::InvalidToken {
            description: e.to_string(),
        })?;

        if !self.algorithms.contains(&header.alg) {
            return Err(AuthError::InvalidToken {
                description: format!("unsupported algorithm {:?}", header.alg),
            });
        }

        let kid = header.kid.ok_or_else(|| AuthError::InvalidToken {
            description: "token header has no key id".to_string(),
        })?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.algorithms = self.algorithms.clone();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = jsonwebtoken::decode::<TokenClaims>(token, &key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                _ => AuthError::InvalidToken {
                    description: e.to_string(),
                },
            }
        })?;

        Ok(data.claims)
    }
}

fn key_from_jwk(jwk: &jsonwebtoken::jwk::Jwk) -> Result<DecodingKey, AuthError> {
    DecodingKey::from_jwk(jwk).map_err(|e| AuthError::KeySetUnavailable {
        message: format!("unusable signing key: {}", e),
    })
}
