//! JWT token utilities for authentication and authorization.
//!
//! [`TokenManager`] issues and verifies signed access/refresh tokens. It is
//! built once from configuration and is immutable afterwards, so it can be
//! shared behind an `Arc` across request handlers without coordination.
//!
//! Stateful checks (revocation, current principal state) are injected
//! through the [`RevocationList`] and [`PrincipalLookup`] traits so the
//! manager itself stays storage-agnostic.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{ServiceError, ServiceResult};

/// Refresh tokens live for a fixed seven day window.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Discriminates what a token may be used for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// The minimum view of a user needed to build claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub is_superadmin: bool,
    pub is_active: bool,
}

/// JWT claims. The flags are a snapshot taken at issuance time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
    pub is_superadmin: bool,
    pub is_active: bool,
    /// Per-issuance identifier, used as the revocation key
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// A freshly signed token with its type and lifetime in seconds.
#[derive(Debug, Clone, Serialize)]
pub struct SignedToken {
    pub token: String,
    pub token_type: TokenType,
    pub expires_in: u64,
}

/// Access and refresh tokens issued together at login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Lifetime of the access token only
    pub expires_in: u64,
}

/// Fatal misconfiguration detected while building a [`TokenManager`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenConfigError {
    #[error("secret key must not be empty")]
    EmptySecret,
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("access token lifetime must be positive and bounded, got {0} minutes")]
    InvalidAccessTtl(i64),
}

/// Looks up the current state of a principal by ID.
#[async_trait]
pub trait PrincipalLookup: Send + Sync {
    async fn find_principal(&self, id: &str) -> ServiceResult<Option<Principal>>;
}

/// A set of revoked token IDs (`jti`).
#[async_trait]
pub trait RevocationList: Send + Sync {
    async fn is_revoked(&self, jti: &str) -> ServiceResult<bool>;

    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> ServiceResult<()>;
}

/// Issues and verifies signed tokens with a process-wide secret.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    access_ttl: Duration,
}

impl TokenManager {
    /// Builds a manager from a shared secret, an HMAC algorithm name and the
    /// access token lifetime.
    pub fn new(
        secret: &str,
        algorithm: &str,
        access_ttl_minutes: i64,
    ) -> Result<Self, TokenConfigError> {
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }
        let access_ttl = Duration::try_minutes(access_ttl_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or(TokenConfigError::InvalidAccessTtl(access_ttl_minutes))?;

        let algorithm = match Algorithm::from_str(algorithm) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
            _ => return Err(TokenConfigError::UnsupportedAlgorithm(algorithm.to_string())),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(TokenManager {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            header: Header::new(algorithm),
            validation,
            access_ttl,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TokenConfigError> {
        Self::new(
            &config.secret_key,
            &config.jwt_algorithm,
            config.access_token_expire_minutes,
        )
    }

    /// Default lifetime for a token type.
    pub fn default_ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => Duration::days(REFRESH_TOKEN_TTL_DAYS),
        }
    }

    /// Signs a new token for `principal`. An explicit `ttl` overrides the
    /// type's default lifetime.
    pub fn issue(
        &self,
        principal: &Principal,
        token_type: TokenType,
        ttl: Option<Duration>,
    ) -> ServiceResult<SignedToken> {
        let ttl = ttl.unwrap_or_else(|| self.default_ttl(token_type));
        if ttl < Duration::seconds(1) {
            return Err(ServiceError::invalid_operation(format!(
                "Token lifetime must be at least one second, got {}s",
                ttl.num_seconds()
            )));
        }

        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            ServiceError::invalid_operation("Token lifetime exceeds the supported range")
        })?;

        let claims = Claims {
            sub: principal.id.clone(),
            email: principal.email.clone(),
            token_type,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            is_superadmin: principal.is_superadmin,
            is_active: principal.is_active,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(SignedToken {
            token: self.sign(&claims)?,
            token_type,
            expires_in: ttl.num_seconds().unsigned_abs(),
        })
    }

    /// Issues an access and a refresh token with their default lifetimes.
    pub fn issue_pair(&self, principal: &Principal) -> ServiceResult<TokenPair> {
        let access = self.issue(principal, TokenType::Access, None)?;
        let refresh = self.issue(principal, TokenType::Refresh, None)?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "bearer".to_string(),
            expires_in: access.expires_in,
        })
    }

    /// Checks signature, expiry and token type, returning the claims.
    ///
    /// Bad signatures, malformed input and expired tokens all produce the
    /// same `Unauthorized` error; the underlying cause is only logged.
    pub fn verify(&self, token: &str, expected: TokenType) -> ServiceResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| {
                tracing::warn!("Token validation failed: {:?}", e.kind());
                ServiceError::unauthorized(INVALID_CREDENTIALS)
            })?;

        if claims.token_type != expected {
            tracing::warn!(
                "Token type mismatch for subject {}: expected {}, got {}",
                claims.sub,
                expected,
                claims.token_type
            );
            return Err(ServiceError::unauthorized(format!(
                "Token type mismatch. Expected {}",
                expected
            )));
        }

        Ok(claims)
    }

    /// [`verify`](Self::verify) followed by a revocation check on `jti`.
    pub async fn verify_unrevoked(
        &self,
        token: &str,
        expected: TokenType,
        revocations: &dyn RevocationList,
    ) -> ServiceResult<Claims> {
        let claims = self.verify(token, expected)?;

        if revocations.is_revoked(&claims.jti).await? {
            tracing::warn!("Rejected revoked {} token {}", expected, claims.jti);
            return Err(ServiceError::unauthorized("Token has been revoked"));
        }

        Ok(claims)
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// The principal is re-fetched so the new token reflects its current
    /// flags; a missing or inactive principal is rejected.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        principals: &dyn PrincipalLookup,
        revocations: &dyn RevocationList,
    ) -> ServiceResult<SignedToken> {
        let claims = self
            .verify_unrevoked(refresh_token, TokenType::Refresh, revocations)
            .await?;

        let principal = principals
            .find_principal(&claims.sub)
            .await?
            .ok_or_else(|| ServiceError::unauthorized(INVALID_CREDENTIALS))?;

        if !principal.is_active {
            tracing::info!("Refresh refused for inactive user {}", principal.id);
            return Err(ServiceError::unauthorized("Inactive user"));
        }

        self.issue(&principal, TokenType::Access, None)
    }

    fn sign(&self, claims: &Claims) -> ServiceResult<String> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }
}
