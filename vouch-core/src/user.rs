//! User model
//!
//! The store owns `UserRecord` including its password hash; everything the
//! service layer hands back out is the hash-free [`PublicUser`] projection.
//!
//! | Field           | Type       | Description                                  |
//! | --------------- | ---------- | -------------------------------------------- |
//! | `id`            | `UserId`   | The unique identifier for the user.          |
//! | `email`         | `String`   | Lowercased email, the account's unique key.  |
//! | `password_hash` | `String`   | One-way derived secret, never serialized out.|
//! | `profile`       | `Profile`  | Display profile captured at registration.    |
//! | `created_at`    | `DateTime` | The timestamp when the record was created.   |
//! | `updated_at`    | `DateTime` | The timestamp when the record last changed.  |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{generate_prefixed_id, validate_prefixed_id};

/// A unique, stable identifier for a specific user.
///
/// Treat the value as opaque; the `usr_` prefix exists for log readability,
/// not for parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for a user ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Postal address attached to a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    #[serde(rename = "zipCode")]
    pub zip_code: String,
}

/// Display profile captured at registration. Only `name` is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,

    #[serde(rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_name: None,
            phone: None,
            address: None,
        }
    }
}

/// A user as persisted by the store. Never serialized to callers;
/// see [`PublicUser`].
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// The unique identifier for the user.
    pub id: UserId,

    /// Lowercased email, unique across the store.
    pub email: String,

    /// One-way derived representation of the secret.
    pub password_hash: String,

    /// Display profile.
    pub profile: Profile,

    /// The timestamp when the record was created.
    pub created_at: DateTime<Utc>,

    /// The timestamp when the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Project the record into its caller-visible shape, dropping the hash.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            profile: self.profile.clone(),
        }
    }
}

/// The caller-visible projection of a user. The password hash does not
/// exist in this type, so it cannot leak through serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub email: String,
    pub profile: Profile,
}

/// Input for creating a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub profile: Profile,
}

impl NewUser {
    pub fn new(email: String, password_hash: String, profile: Profile) -> Self {
        Self {
            id: UserId::new_random(),
            email,
            password_hash,
            profile,
        }
    }
}
