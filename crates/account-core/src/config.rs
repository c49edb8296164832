//! Configuration for the account layer

use std::collections::HashMap;
use std::path::PathBuf;

use ::config::{Config, Environment};
use serde::Deserialize;

use crate::error::Result;

/// Prefix of the environment variables read by [`AppConfiguration::from_env`]
pub const ENV_PREFIX: &str = "VIMEO";

/// Application credentials and account-handling settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfiguration {
    /// OAuth client identifier issued to the application
    pub client_identifier: String,
    pub client_secret: String,
    /// Space-delimited scopes requested by the application
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Key under which the authenticated account is persisted
    #[serde(default = "default_account_storage_key")]
    pub account_storage_key: String,
    /// Directory for the file-backed account store
    #[serde(default)]
    pub storage_directory: Option<PathBuf>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Capacity of the account event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_scope() -> String {
    "public".to_string()
}

fn default_account_storage_key() -> String {
    "vimeo_account".to_string()
}

fn default_api_version() -> String {
    "3.2".to_string()
}

fn default_event_capacity() -> usize {
    64
}

impl AppConfiguration {
    pub fn new(client_identifier: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_identifier: client_identifier.into(),
            client_secret: client_secret.into(),
            scope: default_scope(),
            account_storage_key: default_account_storage_key(),
            storage_directory: None,
            api_version: default_api_version(),
            event_capacity: default_event_capacity(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_account_storage_key(mut self, key: impl Into<String>) -> Self {
        self.account_storage_key = key.into();
        self
    }

    pub fn with_storage_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.storage_directory = Some(directory.into());
        self
    }

    /// Load configuration from `VIMEO_*` environment variables
    ///
    /// `VIMEO_CLIENT_IDENTIFIER` and `VIMEO_CLIENT_SECRET` are required; every
    /// other field falls back to its default.
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`AppConfiguration::from_env`] but reading from the given map
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;

        let config: AppConfiguration = settings.try_deserialize()?;
        tracing::debug!(
            "Loaded app configuration for client {} (scope: {})",
            config.client_identifier,
            config.scope
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccountError;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfiguration::new("client", "secret");
        assert_eq!(config.scope, "public");
        assert_eq!(config.account_storage_key, "vimeo_account");
        assert_eq!(config.event_capacity, 64);
        assert!(config.storage_directory.is_none());
    }

    #[test]
    fn test_from_env_map() {
        let config = AppConfiguration::from_env_map(vars(&[
            ("VIMEO_CLIENT_IDENTIFIER", "abc"),
            ("VIMEO_CLIENT_SECRET", "shh"),
            ("VIMEO_SCOPE", "public private"),
            ("VIMEO_EVENT_CAPACITY", "8"),
        ]))
        .unwrap();

        assert_eq!(config.client_identifier, "abc");
        assert_eq!(config.client_secret, "shh");
        assert_eq!(config.scope, "public private");
        assert_eq!(config.event_capacity, 8);
        assert_eq!(config.api_version, "3.2");
    }

    #[test]
    fn test_missing_client_identifier() {
        let err = AppConfiguration::from_env_map(vars(&[("VIMEO_CLIENT_SECRET", "shh")])).unwrap_err();
        assert!(matches!(err, AccountError::Config(_)));
    }
}
