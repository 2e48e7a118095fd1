//! CLI configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use craft_commerce::Currency;
use craft_data::{TimeoutConfig, DEFAULT_EMAIL_FUNCTION_PATH};
use serde::{Deserialize, Serialize};

/// Environment variable overriding `backend.url`.
pub const ENV_BACKEND_URL: &str = "CRAFT_BACKEND_URL";
/// Environment variable overriding `backend.anon_key`.
pub const ENV_ANON_KEY: &str = "CRAFT_ANON_KEY";

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Hosted backend.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Durable client state.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Time bounds for remote steps.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Transactional email.
    #[serde(default)]
    pub email: EmailConfig,

    /// Storefront settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Apply environment overrides.
    pub fn with_env(mut self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_BACKEND_URL).ok(),
            std::env::var(ENV_ANON_KEY).ok(),
        );
        self
    }

    fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.backend.url = Some(url);
        }
        if let Some(key) = anon_key.filter(|k| !k.trim().is_empty()) {
            self.backend.anon_key = Some(key);
        }
    }

    /// Time bounds as used by the remote layer.
    pub fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig::from_millis(
            self.timeouts.read_ms,
            self.timeouts.write_ms,
            self.timeouts.auth_ms,
            self.timeouts.email_ms,
        )
    }

    /// Store currency.
    pub fn currency(&self) -> Result<Currency> {
        Currency::from_code(&self.store.currency)
            .with_context(|| format!("Unsupported currency: {}", self.store.currency))
    }

    /// How long the product catalog stays fresh.
    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.store.catalog_ttl_secs)
    }
}

/// Hosted backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Public (anon) API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

/// Durable client state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the cart and the session.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".craft").join("state.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Time bounds in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_bound_ms")]
    pub read_ms: u64,
    #[serde(default = "default_bound_ms")]
    pub write_ms: u64,
    #[serde(default = "default_bound_ms")]
    pub auth_ms: u64,
    #[serde(default = "default_email_ms")]
    pub email_ms: u64,
}

fn default_bound_ms() -> u64 {
    3000
}

fn default_email_ms() -> u64 {
    10_000
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            read_ms: default_bound_ms(),
            write_ms: default_bound_ms(),
            auth_ms: default_bound_ms(),
            email_ms: default_email_ms(),
        }
    }
}

/// Transactional email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Send order emails after checkout.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path of the email function under the backend URL.
    #[serde(default = "default_function_path")]
    pub function: String,

    /// Address of the shop owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_function_path() -> String {
    DEFAULT_EMAIL_FUNCTION_PATH.to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            function: default_function_path(),
            owner: None,
        }
    }
}

/// Storefront settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Catalog cache lifetime in seconds.
    #[serde(default = "default_catalog_ttl")]
    pub catalog_ttl_secs: u64,
}

fn default_currency() -> String {
    Currency::default().code().to_string()
}

fn default_catalog_ttl() -> u64 {
    craft_commerce::catalog::DEFAULT_CATALOG_TTL.as_secs()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            catalog_ttl_secs: default_catalog_ttl(),
        }
    }
}

/// Generate a default craft.toml config file.
pub fn generate_default_config() -> String {
    r#"# CoffeeCraft storefront configuration

[backend]
# url = "https://your-project.supabase.co"
# anon_key = "public-anon-key"

[storage]
path = ".craft/state.json"

[timeouts]
read_ms = 3000
write_ms = 3000
auth_ms = 3000
email_ms = 10000

[email]
enabled = true
function = "functions/v1/send-email"
# owner = "owner@example.com"

[store]
currency = "EGP"
catalog_ttl_secs = 300
"#
    .to_string()
}
