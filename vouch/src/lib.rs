//! # Vouch
//!
//! Vouch is a small credential-issuance library: it registers users,
//! authenticates them, issues signed bearer tokens, and throttles
//! repeated login attempts. It owns no transport and no persistence:
//! you bring a [`UserRepository`] (or use the bundled in-memory one) and
//! put whatever HTTP layer you like in front.
//!
//! The [`Vouch`] coordinator wires the pieces together:
//!
//! - password hashing/verification (bcrypt, configurable cost)
//! - stateless HS256 token issuance and verification
//! - a per-key sliding-window login gate with lockout escalation
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::Duration;
//! use vouch::{AuthConfig, Profile, Vouch};
//! use vouch_core::repositories::InMemoryUserRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vouch::Error> {
//!     let config = AuthConfig::new(b"a-long-random-secret".to_vec(), Duration::days(7))?;
//!     let vouch = Vouch::new(Arc::new(InMemoryUserRepository::new()), config);
//!
//!     let registered = vouch
//!         .register("ada@example.com", "correct horse", Profile::new("Ada"))
//!         .await?;
//!
//!     let claims = vouch.verify_session(&registered.token)?;
//!     assert_eq!(claims.email, "ada@example.com");
//!     Ok(())
//! }
//! ```

mod config;

use std::sync::Arc;

use vouch_core::{
    LoginAttemptTracker, PasswordHasher, TokenConfig, TokenIssuer,
    repositories::UserRepository,
    services::{AuthService, UserService},
};

pub use config::{AuthConfig, ENV_HASHING_COST, ENV_SIGNING_SECRET, ENV_TOKEN_EXPIRY};

/// Re-export core types commonly used with the Vouch API.
pub use vouch_core::{
    Decision, Error, Profile, PublicUser, RateLimitConfig, TokenClaims, UserId, error,
    repositories::InMemoryUserRepository, services::AuthResponse,
};

/// The authentication coordinator.
///
/// Owns the auth and user services plus the login-attempt gate, and
/// exposes the operations a transport layer calls: [`register`],
/// [`login`], [`verify_session`], and profile lookups.
///
/// [`register`]: Vouch::register
/// [`login`]: Vouch::login
/// [`verify_session`]: Vouch::verify_session
pub struct Vouch<R: UserRepository> {
    auth_service: Arc<AuthService<R>>,
    user_service: Arc<UserService<R>>,
    attempt_tracker: Arc<LoginAttemptTracker>,
}

impl<R: UserRepository> Vouch<R> {
    /// Create a coordinator over a user store with the given startup
    /// configuration. Attempt limits start at their defaults; see
    /// [`with_rate_limit_config`](Vouch::with_rate_limit_config).
    pub fn new(repository: Arc<R>, config: AuthConfig) -> Self {
        let issuer = TokenIssuer::new(TokenConfig::new(
            config.signing_secret.clone(),
            config.token_expires_in,
        ));
        let hasher = PasswordHasher::new(config.hashing_cost);

        Self {
            auth_service: Arc::new(AuthService::new(repository.clone(), hasher, issuer)),
            user_service: Arc::new(UserService::new(repository)),
            attempt_tracker: Arc::new(LoginAttemptTracker::default()),
        }
    }

    /// Replace the login gate's limits.
    pub fn with_rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.attempt_tracker = Arc::new(LoginAttemptTracker::new(config));
        self
    }

    /// Register a new identity and issue its first token.
    ///
    /// Registration is not throttled; only login attempts are.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        profile: Profile,
    ) -> Result<AuthResponse, Error> {
        self.auth_service.register(email, password, profile).await
    }

    /// Authenticate, gated by the attempt tracker.
    ///
    /// The attempt is counted before the credential check (a denied key
    /// fails with [`error::AuthError::RateLimited`] without touching the
    /// store), and a successful login resets the key's budget.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remote_addr: Option<&str>,
    ) -> Result<AuthResponse, Error> {
        let key = LoginAttemptTracker::derive_key(Some(email), remote_addr);

        if let Err(err) = self.attempt_tracker.check(&key).into_result() {
            tracing::warn!(key = %key, "login denied by attempt tracker");
            return Err(err);
        }

        let response = self.auth_service.login(email, password).await?;
        self.attempt_tracker.reset(&key);

        Ok(response)
    }

    /// Verify a bearer token and return its claims.
    pub fn verify_session(&self, token: &str) -> Result<TokenClaims, Error> {
        self.auth_service.verify_session(token)
    }

    /// Get a user's public profile by ID.
    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<PublicUser>, Error> {
        self.user_service.get_profile_by_id(user_id).await
    }

    /// Get a user's public profile by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<PublicUser>, Error> {
        self.user_service.get_profile_by_email(email).await
    }

    /// The login gate, for transports that need to consult or reset it
    /// directly (e.g. keying by network address on email-less requests).
    pub fn attempt_tracker(&self) -> &LoginAttemptTracker {
        &self.attempt_tracker
    }
}
