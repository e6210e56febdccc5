//! Core functionality for the vouch credential-issuance ecosystem
//!
//! This crate contains the domain logic: password hashing and
//! verification, stateless token issuance, login-attempt throttling, the
//! user model, and the services that orchestrate them over a pluggable
//! user store.
//!
//! See [`services::AuthService`] for registration/login, [`TokenIssuer`]
//! for token handling, and [`LoginAttemptTracker`] for the login gate.
//! The facade crate `vouch` wires these together for application code.

pub mod error;
pub mod id;
pub mod password;
pub mod rate_limit;
pub mod repositories;
pub mod services;
pub mod token;
pub mod user;
pub mod validation;

pub use error::Error;
pub use password::PasswordHasher;
pub use rate_limit::{Decision, LoginAttemptTracker, RateLimitConfig};
pub use token::{TokenClaims, TokenConfig, TokenIssuer};
pub use user::{Profile, PublicUser, UserId, UserRecord};
