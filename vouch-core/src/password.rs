//! Password hashing and verification
//!
//! Secrets are hashed with bcrypt: a random per-call salt and a
//! configurable cost factor, so equal inputs never produce equal outputs
//! and the work factor can track hardware over time. Verification re-hashes
//! with the salt and parameters embedded in the stored value and compares
//! digests in constant time (the bcrypt crate's comparison), so a mismatch
//! position is not observable through timing.
//!
//! Hashing is CPU-bound and blocking in proportion to the cost factor.
//! Callers on an async executor should wrap calls in
//! `tokio::task::spawn_blocking`; [`crate::services::AuthService`] does.

use crate::{Error, error::CryptoError};

/// Salted one-way hasher with a fixed per-instance cost factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Default bcrypt cost. 2^10 rounds keeps interactive logins in the
    /// tens of milliseconds on current hardware.
    pub const DEFAULT_COST: u32 = 10;

    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a secret with a fresh random salt.
    ///
    /// Does not fail for well-formed input; an error here means the
    /// cost factor is out of bcrypt's supported range or the system
    /// entropy source is broken.
    pub fn hash(&self, secret: &str) -> Result<String, Error> {
        bcrypt::hash(secret, self.cost)
            .map_err(|e| CryptoError::PasswordHash(e.to_string()).into())
    }

    /// Verify a secret against a stored hash.
    ///
    /// A mismatch is a normal `false`, never an error. A stored value that
    /// does not decode as a bcrypt hash also verifies `false`: from the
    /// caller's perspective it is simply a credential that cannot match.
    pub fn verify(&self, secret: &str, hashed: &str) -> bool {
        bcrypt::verify(secret, hashed).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COST)
    }
}
