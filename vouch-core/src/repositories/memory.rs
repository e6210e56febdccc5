//! In-memory user store
//!
//! A concurrent-map-backed [`UserRepository`] used by the test suites and
//! by embedders that don't need durability. The email index is claimed
//! through the map's entry API, so two concurrent inserts of the same
//! email resolve to exactly one winner and one duplicate-key error.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::{
    Error,
    error::StorageError,
    repositories::UserRepository,
    user::{NewUser, UserId, UserRecord},
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<UserId, UserRecord>,
    email_index: DashMap<String, UserId>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<UserRecord, Error> {
        // Claim the email first; the entry guard makes the claim atomic.
        match self.email_index.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::Duplicate(user.email).into());
            }
            Entry::Vacant(vacant) => {
                vacant.insert(user.id.clone());
            }
        }

        let now = Utc::now();
        let record = UserRecord {
            id: user.id.clone(),
            email: user.email,
            password_hash: user.password_hash,
            profile: user.profile,
            created_at: now,
            updated_at: now,
        };

        self.users.insert(user.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, Error> {
        Ok(self.users.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, Error> {
        let Some(id) = self.email_index.get(email).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };

        self.find_by_id(&id).await
    }
}
