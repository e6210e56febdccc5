//! Authentication service
//!
//! Orchestrates registration, login, and session verification over the
//! user store, the password hasher, and the token issuer.
//!
//! Login failures are uniform: an unknown identity and a wrong secret are
//! the same [`AuthError::InvalidCredentials`], so callers cannot probe
//! which accounts exist. Attempt throttling is deliberately not done here;
//! it is a gate layered in front of this service (see the facade crate).

use std::sync::Arc;

use crate::{
    Error,
    error::{AuthError, CryptoError, StorageError},
    password::PasswordHasher,
    token::{TokenClaims, TokenIssuer},
    repositories::UserRepository,
    user::{NewUser, Profile, PublicUser},
    validation::{validate_email, validate_password, validate_profile_name},
};

/// Result of a successful registration or login. Carries the bearer token
/// and the public projection of the user, never the hash.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Service for credential registration, verification, and token issuance.
pub struct AuthService<R: UserRepository> {
    repository: Arc<R>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repository: Arc<R>, hasher: PasswordHasher, issuer: TokenIssuer) -> Self {
        Self {
            repository,
            hasher,
            issuer,
        }
    }

    /// Register a new identity and issue its first token.
    ///
    /// The identity is case-folded to lowercase before any lookup or
    /// insert. An identity already on record fails with
    /// [`AuthError::DuplicateIdentity`], including the case where a
    /// concurrent registration wins the insert race after our lookup.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        profile: Profile,
    ) -> Result<AuthResponse, Error> {
        validate_email(email)?;
        validate_password(password)?;
        validate_profile_name(&profile.name)?;

        let email = email.to_lowercase();

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity.into());
        }

        let password_hash = self.hash_blocking(password.to_string()).await?;

        let record = match self
            .repository
            .insert(NewUser::new(email, password_hash, profile))
            .await
        {
            Ok(record) => record,
            // Lost the insert race to a concurrent registration.
            Err(Error::Storage(StorageError::Duplicate(_))) => {
                return Err(AuthError::DuplicateIdentity.into());
            }
            Err(e) => return Err(e),
        };

        tracing::info!(user_id = %record.id, "registered new user");

        let token = self.issuer.issue(&record.id, &record.email)?;

        Ok(AuthResponse {
            token,
            user: record.to_public(),
        })
    }

    /// Authenticate an identity and issue a token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let email = email.to_lowercase();

        let record = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = self
            .verify_blocking(password.to_string(), record.password_hash.clone())
            .await;
        if !verified {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.issuer.issue(&record.id, &record.email)?;

        Ok(AuthResponse {
            token,
            user: record.to_public(),
        })
    }

    /// Verify a bearer token and return its claims. Propagates
    /// [`crate::error::TokenError::Invalid`] unchanged.
    pub fn verify_session(&self, token: &str) -> Result<TokenClaims, Error> {
        self.issuer.verify(token)
    }

    /// Hashing is CPU-bound for the full cost factor; keep it off the
    /// async dispatch path.
    async fn hash_blocking(&self, password: String) -> Result<String, Error> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Crypto(CryptoError::PasswordHash(e.to_string())))?
    }

    async fn verify_blocking(&self, password: String, hash: String) -> bool {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TokenError, ValidationError};
    use crate::repositories::InMemoryUserRepository;
    use crate::token::TokenConfig;
    use chrono::Duration;

    const TEST_SECRET: &[u8] = b"test_secret_key_for_hs256_tokens_not_for_production_use";

    fn service() -> AuthService<InMemoryUserRepository> {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            PasswordHasher::new(4),
            TokenIssuer::new(TokenConfig::new(TEST_SECRET.to_vec(), Duration::hours(1))),
        )
    }

    #[tokio::test]
    async fn test_register_issues_resolvable_token() {
        let service = service();

        let response = service
            .register("u@e.com", "abcdef", Profile::new("Ursula"))
            .await
            .unwrap();

        assert_eq!(response.user.email, "u@e.com");

        let claims = service.verify_session(&response.token).unwrap();
        assert_eq!(claims.subject_id(), response.user.id);
        assert_eq!(claims.email, "u@e.com");
    }

    #[tokio::test]
    async fn test_register_lowercases_identity() {
        let service = service();

        let response = service
            .register("Mixed.Case@Example.COM", "abcdef", Profile::new("Ada"))
            .await
            .unwrap();

        assert_eq!(response.user.email, "mixed.case@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let service = service();

        service
            .register("a@x.com", "abcdef", Profile::new("Ada"))
            .await
            .unwrap();

        let result = service
            .register("a@x.com", "ghijkl", Profile::new("Another"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::DuplicateIdentity))
        ));

        // Identity comparison is case-insensitive.
        let result = service
            .register("A@X.com", "ghijkl", Profile::new("Shouty"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::DuplicateIdentity))
        ));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let service = service();

        let result = service
            .register("not-an-email", "abcdef", Profile::new("Ada"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidEmail(_)))
        ));

        let result = service.register("a@x.com", "short", Profile::new("Ada")).await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidPassword(_)))
        ));

        let result = service.register("a@x.com", "abcdef", Profile::new("")).await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::MissingField(_)))
        ));
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let service = service();

        let registered = service
            .register("a@x.com", "abcdef", Profile::new("Ada"))
            .await
            .unwrap();

        let response = service.login("a@x.com", "abcdef").await.unwrap();
        assert_eq!(response.user.id, registered.user.id);

        // Identity lookup is case-insensitive on login too.
        let response = service.login("A@X.com", "abcdef").await.unwrap();
        assert_eq!(response.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let service = service();

        service
            .register("a@x.com", "abcdef", Profile::new("Ada"))
            .await
            .unwrap();

        // Wrong secret and unknown identity collapse to one kind.
        let wrong_password = service.login("a@x.com", "wrong-password").await;
        assert!(matches!(
            wrong_password,
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));

        let unknown_identity = service.login("nobody@x.com", "abcdef").await;
        assert!(matches!(
            unknown_identity,
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_verify_session_rejects_garbage() {
        let service = service();

        let result = service.verify_session("invalid.jwt.token");
        assert!(matches!(result, Err(Error::Token(TokenError::Invalid))));
    }
}
