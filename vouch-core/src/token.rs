//! Stateless identity tokens
//!
//! Tokens are compact JWTs signed with a process-wide HS256 secret. The
//! claims are self-contained: verification needs no store lookup, only the
//! signing secret. The secret and expiry duration are fixed at process
//! start; construction of a [`TokenConfig`] is the startup precondition.
//!
//! Verification collapses every failure (bad signature, malformed
//! structure, expired claims) into [`TokenError::Invalid`], so callers
//! cannot probe which check rejected a token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    Error, UserId,
    error::{CryptoError, TokenError},
};

/// Configuration for token issuance: signing secret and claim lifetime.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Symmetric HS256 signing secret.
    pub secret: Vec<u8>,
    /// How long issued claims stay valid.
    pub expires_in: Duration,
    /// Issuer claim, omitted when `None`.
    pub issuer: Option<String>,
}

impl TokenConfig {
    pub fn new(secret: Vec<u8>, expires_in: Duration) -> Self {
        Self {
            secret,
            expires_in,
            issuer: None,
        }
    }

    /// Set the issuer claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

/// Claims carried by an issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - user ID
    pub sub: String,
    /// Identity (lowercased email) the token was issued for
    pub email: String,
    /// Issued at in seconds (as UTC timestamp)
    pub iat: i64,
    /// Expiration time in seconds (as UTC timestamp)
    pub exp: i64,
    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl TokenClaims {
    pub fn subject_id(&self) -> UserId {
        UserId::new(&self.sub)
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_else(Utc::now)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Issues and verifies signed identity tokens.
pub struct TokenIssuer {
    config: TokenConfig,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Issue a token for a subject. `exp` is always `iat` plus the
    /// configured lifetime.
    pub fn issue(&self, user_id: &UserId, email: &str) -> Result<String, Error> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.expires_in).timestamp(),
            iss: self.config.issuer.clone(),
        };

        self.sign(&claims)
    }

    /// Verify a token and return its claims.
    ///
    /// Fails with [`TokenError::Invalid`] when the signature does not
    /// verify, the structure is malformed, or the claims are expired.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // jsonwebtoken defaults to 60s of leeway; expiry here is exact.
        validation.leeway = 0;

        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(&self.config.secret),
            &validation,
        )
        .map_err(|_| TokenError::Invalid)?;

        // The library treats exp == now as still valid; the contract is
        // that a token is dead the moment its expiry is reached.
        if Utc::now().timestamp() >= token_data.claims.exp {
            return Err(TokenError::Invalid.into());
        }

        Ok(token_data.claims)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, Error> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&self.config.secret),
        )
        .map_err(|e| CryptoError::JwtSigning(e.to_string()).into())
    }
}
