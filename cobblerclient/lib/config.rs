//! Client configuration.

use std::env;

use getset::{Getters, Setters};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{CobblerError, CobblerResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The API endpoint of a server running on the local machine.
pub const DEFAULT_URL: &str = "http://127.0.0.1/cobbler_api";

/// The environment variable holding the API endpoint.
pub const COBBLER_URL_ENV_VAR: &str = "COBBLER_URL";

/// The environment variable holding the login user.
pub const COBBLER_USERNAME_ENV_VAR: &str = "COBBLER_USERNAME";

/// The environment variable holding the login password.
pub const COBBLER_PASSWORD_ENV_VAR: &str = "COBBLER_PASSWORD";

/// The environment variable holding the number of retries for transient HTTP failures.
pub const COBBLER_RETRIES_ENV_VAR: &str = "COBBLER_RETRIES";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where the server lives and how to log in to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder, Getters, Setters)]
#[getset(get = "pub with_prefix", set = "pub")]
pub struct ClientConfig {
    /// The API endpoint.
    #[serde(default = "ClientConfig::default_url")]
    #[builder(default = ClientConfig::default_url(), setter(into))]
    url: String,

    /// The login user.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[builder(default, setter(strip_option, into))]
    username: Option<String>,

    /// The login password.
    #[serde(skip_serializing, default)]
    #[builder(default, setter(strip_option, into))]
    password: Option<String>,

    /// How many times a transient HTTP failure is retried. Zero disables retries.
    #[serde(default)]
    #[builder(default)]
    retries: u32,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ClientConfig {
    /// Reads the configuration from the environment, loading a `.env` file first if there is one.
    pub fn from_env() -> CobblerResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(CobblerError::custom(e));
            }
        }

        let retries = match env::var(COBBLER_RETRIES_ENV_VAR) {
            Ok(value) => value.trim().parse().map_err(|e| {
                CobblerError::Validation(format!(
                    "{COBBLER_RETRIES_ENV_VAR} must be a non-negative integer: {e}"
                ))
            })?,
            Err(_) => 0,
        };

        Ok(Self {
            url: env::var(COBBLER_URL_ENV_VAR).unwrap_or_else(|_| Self::default_url()),
            username: env::var(COBBLER_USERNAME_ENV_VAR).ok(),
            password: env::var(COBBLER_PASSWORD_ENV_VAR).ok(),
            retries,
        })
    }

    /// Returns `true` if both a user and a password are configured.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Returns the default API endpoint.
    pub fn default_url() -> String {
        DEFAULT_URL.to_string()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.get_url(), DEFAULT_URL);
        assert_eq!(*config.get_retries(), 0);
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::builder()
            .url("https://cobbler.example.com/cobbler_api")
            .username("cobbler")
            .password("secret")
            .retries(3)
            .build();

        assert_eq!(config.get_url(), "https://cobbler.example.com/cobbler_api");
        assert_eq!(config.get_username().as_deref(), Some("cobbler"));
        assert!(config.has_credentials());
        assert_eq!(*config.get_retries(), 3);
    }

    #[test]
    fn test_client_config_never_serializes_password() -> anyhow::Result<()> {
        let config = ClientConfig::builder()
            .username("cobbler")
            .password("secret")
            .build();

        let json = serde_json::to_string(&config)?;
        assert!(json.contains("cobbler"));
        assert!(!json.contains("secret"));

        let parsed: ClientConfig = serde_json::from_str(r#"{"username":"cobbler"}"#)?;
        assert_eq!(parsed.get_url(), DEFAULT_URL);
        assert_eq!(*parsed.get_retries(), 0);
        Ok(())
    }
}
