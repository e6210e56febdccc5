use std::sync::Arc;

use crate::{Error, repositories::UserRepository, user::{PublicUser, UserId}};

/// Service for user profile lookups. Only ever hands out the public
/// projection of a record.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Get a user's public profile by ID
    pub async fn get_profile_by_id(&self, user_id: &UserId) -> Result<Option<PublicUser>, Error> {
        Ok(self
            .repository
            .find_by_id(user_id)
            .await?
            .map(|record| record.to_public()))
    }

    /// Get a user's public profile by email
    pub async fn get_profile_by_email(&self, email: &str) -> Result<Option<PublicUser>, Error> {
        Ok(self
            .repository
            .find_by_email(&email.to_lowercase())
            .await?
            .map(|record| record.to_public()))
    }
}
