//! # Session Tokens
//!
//! Signed (HS256) session tokens carrying the caller identity.
//!
//! Tokens travel in `Authorization: JWT <token>`. A login either gets a token
//! that expires after 24 hours or, when the user asks to stay logged in, a
//! token with no `exp` claim at all.

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;

/// Authorization scheme keyword
pub const AUTH_SCHEME: &str = "JWT";

/// Lifetime of an expiring token
pub const TOKEN_TTL_HOURS: i64 = 24;

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            is_admin,
        }
    }

    /// Fail with `Unauthorized` unless the caller is an admin
    pub fn require_admin(&self) -> ShopResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ShopError::Unauthorized("admin access required".to_string()))
        }
    }
}

/// Token lifetime policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenTtl {
    /// Expires after [`TOKEN_TTL_HOURS`]
    #[default]
    Expiring,
    /// Never expires (persistent login)
    Persistent,
}

impl TokenTtl {
    pub fn from_keep_logged(keep_logged: bool) -> Self {
        if keep_logged {
            TokenTtl::Persistent
        } else {
            TokenTtl::Expiring
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    identity: Identity,
    iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Issues and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Create a signer from a secret
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        // persistent tokens carry no `exp`; it is still checked when present
        validation.required_spec_claims.clear();
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Load the secret from `JWT_SECRET`
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok();

        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => Ok(Self::new(secret)),
            _ => Err(ShopError::Configuration("JWT_SECRET not set".to_string())),
        }
    }

    /// Sign a token for `identity`
    pub fn issue(&self, identity: &Identity, ttl: TokenTtl) -> ShopResult<String> {
        self.issue_at(identity, ttl, Utc::now())
    }

    /// Sign a token as if issued at `now`
    pub fn issue_at(
        &self,
        identity: &Identity,
        ttl: TokenTtl,
        now: DateTime<Utc>,
    ) -> ShopResult<String> {
        let exp = match ttl {
            TokenTtl::Expiring => Some((now + Duration::hours(TOKEN_TTL_HOURS)).timestamp()),
            TokenTtl::Persistent => None,
        };
        let claims = Claims {
            identity: identity.clone(),
            iat: now.timestamp(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ShopError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and return the identity it carries
    pub fn verify(&self, token: &str) -> ShopResult<Identity> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.identity)
            .map_err(|e| ShopError::Unauthenticated(format!("invalid token: {}", e)))
    }

    /// Verify the value of an `Authorization` header
    pub fn verify_header(&self, header: Option<&str>) -> ShopResult<Identity> {
        let token = token_from_header(header)?;
        self.verify(token)
    }
}

/// Extract the token from `JWT <token>`; the scheme is case-insensitive
pub fn token_from_header(header: Option<&str>) -> ShopResult<&str> {
    let header = header
        .ok_or_else(|| ShopError::Unauthenticated("missing Authorization header".to_string()))?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| ShopError::Unauthenticated("malformed Authorization header".to_string()))?;
    if !scheme.eq_ignore_ascii_case(AUTH_SCHEME) {
        return Err(ShopError::Unauthenticated(format!(
            "unsupported authorization scheme: {}",
            scheme
        )));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(ShopError::Unauthenticated("empty token".to_string()));
    }
    Ok(token)
}
