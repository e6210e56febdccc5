//! Startup configuration
//!
//! The signing secret and token lifetime are process-wide and fixed at
//! startup. Absence of either is startup-fatal: [`AuthConfig::from_env`]
//! fails with [`ConfigError::Missing`] and the process must not begin
//! serving traffic. There are no fallback defaults for secret material.

use chrono::Duration;
use vouch_core::{
    Error, PasswordHasher,
    error::ConfigError,
};

/// Environment variable holding the HS256 signing secret.
pub const ENV_SIGNING_SECRET: &str = "JWT_SECRET";

/// Environment variable holding the token lifetime, e.g. `7d`, `12h`,
/// `30m`, or a bare number of seconds.
pub const ENV_TOKEN_EXPIRY: &str = "JWT_EXPIRES_IN";

/// Environment variable holding the bcrypt cost factor (optional).
pub const ENV_HASHING_COST: &str = "BCRYPT_COST";

/// Process-wide authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Opaque secret bytes for token signing.
    pub signing_secret: Vec<u8>,
    /// Lifetime of issued tokens.
    pub token_expires_in: Duration,
    /// bcrypt work factor for password hashing.
    pub hashing_cost: u32,
}

impl AuthConfig {
    /// Build a configuration from explicit values.
    ///
    /// Fails when the secret is empty or the lifetime is not positive,
    /// the same preconditions `from_env` enforces.
    pub fn new(signing_secret: Vec<u8>, token_expires_in: Duration) -> Result<Self, Error> {
        if signing_secret.is_empty() {
            return Err(ConfigError::Missing(ENV_SIGNING_SECRET.to_string()).into());
        }

        if token_expires_in <= Duration::zero() {
            return Err(ConfigError::Invalid {
                name: ENV_TOKEN_EXPIRY.to_string(),
                reason: "token lifetime must be positive".to_string(),
            }
            .into());
        }

        Ok(Self {
            signing_secret,
            token_expires_in,
            hashing_cost: PasswordHasher::DEFAULT_COST,
        })
    }

    /// Override the bcrypt cost factor.
    pub fn with_hashing_cost(mut self, cost: u32) -> Self {
        self.hashing_cost = cost;
        self
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    /// `from_env` is this with `std::env::var`; tests inject a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let secret = lookup(ENV_SIGNING_SECRET)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Missing(ENV_SIGNING_SECRET.to_string()))?;

        let expiry = lookup(ENV_TOKEN_EXPIRY)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Missing(ENV_TOKEN_EXPIRY.to_string()))?;

        let mut config = Self::new(secret.into_bytes(), parse_duration(&expiry)?)?;

        if let Some(cost) = lookup(ENV_HASHING_COST) {
            let cost = cost.parse::<u32>().map_err(|_| ConfigError::Invalid {
                name: ENV_HASHING_COST.to_string(),
                reason: format!("not an integer: {cost}"),
            })?;
            config = config.with_hashing_cost(cost);
        }

        Ok(config)
    }
}

/// Parse a lifetime like `7d`, `12h`, `30m`, `45s`, or bare seconds.
fn parse_duration(value: &str) -> Result<Duration, Error> {
    let invalid = |reason: &str| ConfigError::Invalid {
        name: ENV_TOKEN_EXPIRY.to_string(),
        reason: format!("{reason}: {value}"),
    };

    let (number, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(0) => return Err(invalid("expected a leading number").into()),
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };

    let number: i64 = number
        .parse()
        .map_err(|_| invalid("number out of range"))?;

    match unit {
        "s" => Ok(Duration::seconds(number)),
        "m" => Ok(Duration::minutes(number)),
        "h" => Ok(Duration::hours(number)),
        "d" => Ok(Duration::days(number)),
        _ => Err(invalid("unknown unit, expected s/m/h/d").into()),
    }
}
