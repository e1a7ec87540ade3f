//! Configuration types and loading
//!
//! The config file path resolves CLI arg > CONFIG_PATH env var > default.
//! The site secret is loaded from the NEXUDUS_SITE_SECRET env var or
//! site_secret_file, never from the TOML itself, so the config file can
//! be committed without leaking key material.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use common::{Secret, SettingsStore};
use nexudus_auth::{CLIENT_ID_SETTING, TOKEN_URL_SETTING};
use nexudus_catalog::{
    BASE_URL_SETTING, CACHE_TTL_SETTING, MEMBERSHIPS_ENDPOINT_SETTING, ROOMS_ENDPOINT_SETTING,
    TEST_PATH_SETTING,
};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub tenant: TenantConfig,
    pub storage: StorageConfig,
}

/// Tenant API settings
#[derive(Debug, Deserialize)]
pub struct TenantConfig {
    pub base_url: String,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub memberships_endpoint: Option<String>,
    #[serde(default)]
    pub rooms_endpoint: Option<String>,
    #[serde(default)]
    pub cache_ttl: Option<u64>,
    #[serde(default)]
    pub connection_test_path: Option<String>,
}

/// Local state storage settings
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub state_dir: PathBuf,
    /// Path to a file containing the site secret (alternative to the
    /// NEXUDUS_SITE_SECRET env var)
    #[serde(default)]
    pub site_secret_file: Option<PathBuf>,
    #[serde(skip)]
    pub site_secret: Option<Secret<String>>,
}

impl Config {
    /// Load and validate the TOML config, then resolve the site secret.
    ///
    /// Site secret resolution order:
    /// 1. NEXUDUS_SITE_SECRET env var
    /// 2. site_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.tenant.base_url.starts_with("http://")
            && !config.tenant.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "tenant.base_url must start with http:// or https://, got: {}",
                config.tenant.base_url
            )));
        }

        if config.tenant.cache_ttl == Some(0) {
            return Err(common::Error::Config(
                "tenant.cache_ttl must be greater than 0".into(),
            ));
        }

        // Resolve site secret: env var takes precedence over file
        if let Ok(secret) = std::env::var("NEXUDUS_SITE_SECRET") {
            config.storage.site_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.storage.site_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read site_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.storage.site_secret = Some(Secret::new(secret));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("nexudus-catalog.toml")
    }

    /// Settings-store view over the loaded tenant table; absent optional
    /// fields are absent keys.
    pub fn settings(&self) -> ConfigSettings {
        let mut values = HashMap::new();
        values.insert(BASE_URL_SETTING.to_string(), self.tenant.base_url.clone());
        let optional = [
            (TOKEN_URL_SETTING, self.tenant.token_url.clone()),
            (CLIENT_ID_SETTING, self.tenant.client_id.clone()),
            (
                MEMBERSHIPS_ENDPOINT_SETTING,
                self.tenant.memberships_endpoint.clone(),
            ),
            (ROOMS_ENDPOINT_SETTING, self.tenant.rooms_endpoint.clone()),
            (
                CACHE_TTL_SETTING,
                self.tenant.cache_ttl.map(|t| t.to_string()),
            ),
            (TEST_PATH_SETTING, self.tenant.connection_test_path.clone()),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                values.insert(key.to_string(), value);
            }
        }
        ConfigSettings { values }
    }
}

/// Immutable settings snapshot built from the config file.
pub struct ConfigSettings {
    values: HashMap<String, String>,
}

impl SettingsStore for ConfigSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
