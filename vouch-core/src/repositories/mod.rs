//! Repository traits for the user store boundary
//!
//! The persistent store is an external collaborator; this module defines
//! the seam the service layer speaks through, plus an in-memory
//! implementation for tests and embedded use.

pub mod memory;

pub use memory::InMemoryUserRepository;

use async_trait::async_trait;

use crate::{
    Error,
    user::{NewUser, UserId, UserRecord},
};

/// Repository for user data access.
///
/// `insert` must enforce email uniqueness and fail with
/// [`crate::error::StorageError::Duplicate`] when the email is already
/// claimed; the service layer relies on that to close the lookup/insert
/// race on registration.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user and return the stored record.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, Error>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, Error>;

    /// Find a user by (lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, Error>;
}
