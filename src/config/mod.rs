use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::errors::{ListingsError, ListingsResult};
use crate::models::{Credentials, ListingsProviderInfo};
use crate::utils::time::LocalZone;
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Remote listings service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Total per-request timeout enforced by the HTTP client
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// How long an issued token is reused before a refresh
    #[serde(default = "default_token_lifetime", with = "duration_serde::duration")]
    pub token_lifetime: Duration,
    /// Quiet period after the service rejects the credentials
    #[serde(default = "default_auth_cooldown", with = "duration_serde::duration")]
    pub auth_cooldown: Duration,
}

/// Listings account; empty strings are treated as absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub listings_id: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postal_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// IANA zone used when widening the schedule date window; host zone when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_token_lifetime() -> Duration {
    DEFAULT_TOKEN_LIFETIME
}

fn default_auth_cooldown() -> Duration {
    DEFAULT_AUTH_COOLDOWN
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
            token_lifetime: default_token_lifetime(),
            auth_cooldown: default_auth_cooldown(),
        }
    }
}

impl AccountConfig {
    pub fn provider_info(&self) -> ListingsProviderInfo {
        ListingsProviderInfo {
            credentials: Credentials::new(&self.username, &self.password),
            listings_id: self.listings_id.clone(),
        }
    }
}

impl Config {
    /// Load from the file named by `LISTINGS_SYNC_CONFIG`, else the default path
    pub fn load() -> Result<Self> {
        Self::load_from_file(&Self::config_path(|key| std::env::var(key).ok()))
    }

    pub fn config_path<F>(lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(CONFIG_FILE_ENV)
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let mut config = if Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str::<Self>(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay credential settings from a key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup(USERNAME_ENV) {
            self.account.username = username;
        }
        if let Some(password) = lookup(PASSWORD_ENV) {
            self.account.password = password;
        }
        if let Some(listings_id) = lookup(LISTINGS_ID_ENV) {
            self.account.listings_id = listings_id;
        }
    }

    pub fn validate(&self) -> ListingsResult<()> {
        UrlUtils::parse_and_validate(&self.service.base_url).map_err(|e| {
            ListingsError::configuration(format!(
                "Invalid service base_url '{}': {e}",
                self.service.base_url
            ))
        })?;

        if self.service.token_lifetime.is_zero() {
            return Err(ListingsError::configuration(
                "service.token_lifetime must be greater than zero",
            ));
        }

        self.local_zone()?;
        Ok(())
    }

    pub fn local_zone(&self) -> ListingsResult<LocalZone> {
        match self.sync.timezone.as_deref() {
            Some(name) if !name.trim().is_empty() => LocalZone::named(name),
            _ => Ok(LocalZone::System),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_applied_for_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.service.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.service.token_lifetime, Duration::from_secs(72_000));
        assert_eq!(config.service.auth_cooldown, Duration::from_secs(60));
        assert!(config.account.username.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parses_full_file() {
        let config: Config = toml::from_str(
            r#"
            [service]
            base_url = "https://listings.example.com/v1"
            request_timeout = "30s"
            token_lifetime = "12h"

            [account]
            username = "viewer"
            password = "secret"
            listings_id = "USA-NY67791-X"

            [sync]
            timezone = "America/New_York"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.request_timeout, Duration::from_secs(30));
        assert_eq!(config.service.token_lifetime, Duration::from_secs(12 * 3600));
        assert_eq!(config.service.connect_timeout, DEFAULT_CONNECT_TIMEOUT);

        let info = config.account.provider_info();
        assert_eq!(info.credentials.username, "viewer");
        assert_eq!(info.listings_id, "USA-NY67791-X");
        assert!(matches!(config.local_zone().unwrap(), LocalZone::Named(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.service.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ListingsError::Configuration { .. })
        ));

        let mut config = Config::default();
        config.sync.timezone = Some("Mars/Olympus_Mons".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.service.token_lifetime = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_replace_account_fields() {
        let env: HashMap<&str, &str> = HashMap::from([
            (USERNAME_ENV, "from-env"),
            (LISTINGS_ID_ENV, "GBR-0001234-DEFAULT"),
        ]);

        let mut config = Config::default();
        config.account.password = "kept".to_string();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.account.username, "from-env");
        assert_eq!(config.account.password, "kept");
        assert_eq!(config.account.listings_id, "GBR-0001234-DEFAULT");
    }

    #[test]
    fn test_config_path_honours_env() {
        assert_eq!(
            Config::config_path(|key| (key == CONFIG_FILE_ENV).then(|| "/etc/listings.toml".to_string())),
            "/etc/listings.toml"
        );
        assert_eq!(Config::config_path(|_| None), DEFAULT_CONFIG_FILE);
        assert_eq!(Config::config_path(|_| Some(" ".to_string())), DEFAULT_CONFIG_FILE);
    }

    #[test]
    fn test_load_from_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings-sync.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load_from_file(path_str).unwrap();
        assert!(path.exists());
        assert_eq!(config.service.base_url, DEFAULT_BASE_URL);

        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(reloaded.service.auth_cooldown, config.service.auth_cooldown);
    }
}
