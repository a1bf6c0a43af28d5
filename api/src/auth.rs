use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::providers::{ProviderError, fetch_json};
use crate::state::AppState;

const PROVIDER: &str = "identity provider";

/// Cached keys are refetched once they are this old.
const KEYS_MAX_AGE: Duration = Duration::from_secs(60 * 60);
/// An unknown `kid` triggers at most one refetch per interval.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
/// `user_id` is the token's verified `sub` claim.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is malformed or its signature is invalid: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("token header has no key id")]
    MissingKeyId,
    #[error("no signing key with id '{0}'")]
    UnknownKey(String),
    #[error("token subject is empty")]
    EmptySubject,
    #[error(transparent)]
    Keys(#[from] ProviderError),
}

/// Verifies a bearer token and returns the stable user identifier it carries.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
}

pub(crate) fn subject(claims: Claims) -> Result<String, AuthError> {
    Some(claims.sub)
        .filter(|s| !s.trim().is_empty())
        .ok_or(AuthError::EmptySubject)
}

/// Verifies RS256 session tokens against the identity provider's JWKS.
///
/// The key set is cached. It is refetched when it expires, or when a token
/// names a `kid` the cache does not hold, so rotation needs no restart.
pub struct JwksVerifier {
    http: reqwest::Client,
    jwks_url: String,
    secret_key: Option<String>,
    keys: RwLock<Option<CachedKeys>>,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

impl JwksVerifier {
    pub fn new(http: reqwest::Client, jwks_url: String, secret_key: Option<String>) -> Self {
        Self {
            http,
            jwks_url,
            secret_key,
            keys: RwLock::new(None),
        }
    }

    async fn signing_keys(&self) -> Result<JwkSet, ProviderError> {
        let secret = self.secret_key.as_deref().ok_or(ProviderError::MissingKey {
            provider: PROVIDER,
            env_var: "AUTH_SECRET_KEY",
        })?;
        fetch_json(PROVIDER, self.http.get(&self.jwks_url).bearer_auth(secret)).await
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        let may_refresh = match self.keys.read().await.as_ref() {
            Some(cached) if cached.fetched_at.elapsed() < KEYS_MAX_AGE => {
                if let Some(jwk) = cached.set.find(kid) {
                    return Ok(jwk.clone());
                }
                cached.fetched_at.elapsed() >= MIN_REFRESH_INTERVAL
            }
            _ => true,
        };
        if !may_refresh {
            return Err(AuthError::UnknownKey(kid.to_string()));
        }

        let set = self.signing_keys().await?;
        let jwk = set.find(kid).cloned();
        tracing::debug!(keys = set.keys.len(), "identity provider keys refreshed");
        *self.keys.write().await = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });
        jwk.ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;
        let data = decode::<Claims>(token, &key, &validation)?;
        subject(data.claims)
    }
}

/// Extract bearer token from the Authorization header.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing Authorization header".to_string(),
            docs_hint: Some("Include 'Authorization: Bearer <token>' header.".to_string()),
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header must use Bearer scheme".to_string(),
            docs_hint: Some("Format: 'Authorization: Bearer <token>'".to_string()),
        })
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        match state.auth.verify(token).await {
            Ok(user_id) => Ok(AuthenticatedUser { user_id }),
            Err(err) => {
                tracing::warn!(error = %err, "Authentication failed");
                Err(AppError::Unauthorized {
                    message: "Authentication failed".to_string(),
                    docs_hint: Some(
                        "Sign in again to obtain a fresh session token.".to_string(),
                    ),
                })
            }
        }
    }
}
