//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use craft_auth::{HttpAuthProvider, SessionAdapter};
use craft_cache::Cache;
use craft_commerce::cart::CartStore;
use craft_commerce::email::{EdgeFunctionMailer, EmailDispatcher};
use craft_commerce::notify::Notifier;
use craft_commerce::RemoteStore;
use craft_data::{EmailFunctionClient, FetchClient};
use craft_db::{Db, RestStore};

use crate::config::CliConfig;
use crate::output::Output;

/// Config file names, in lookup order.
pub const CONFIG_NAMES: [&str; 3] = ["craft.toml", ".craft.toml", "craft.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the configuration came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            match find_config(&cwd) {
                Some((path, config)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        Ok(Self {
            config: config.with_env(),
            config_path,
            output,
            cwd,
        })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// File holding the cart and the session.
    pub fn storage_path(&self) -> PathBuf {
        self.resolve_path(&self.config.storage.path)
    }

    /// Open the durable client state.
    pub fn cache(&self) -> Result<Cache> {
        let path = self.storage_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Cache::open_file(&path).with_context(|| format!("Failed to open storage file {}", path.display()))
    }

    /// HTTP client for the configured backend.
    pub fn fetch_client(&self) -> Result<FetchClient> {
        let Some(url) = self.config.backend.url.as_deref() else {
            bail!(
                "No backend URL configured. Set [backend] url in craft.toml or {}.",
                crate::config::ENV_BACKEND_URL
            );
        };

        let mut client = FetchClient::new(url).with_timeouts(self.config.timeout_config());
        if let Some(key) = self.config.backend.anon_key.as_deref() {
            client = client.with_api_key(key);
        }
        Ok(client)
    }

    /// Table access, authorized as the signed-in user when there is one.
    pub fn remote(&self, access_token: Option<String>) -> Result<RemoteStore> {
        let mut client = self.fetch_client()?;
        if let Some(token) = access_token {
            client = client.with_bearer(token);
        }
        let db = Db::new(Arc::new(RestStore::new(client)));
        Ok(RemoteStore::new(db, self.config.timeout_config()))
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::new(self.output.notifier())
    }

    /// Order email dispatcher, unless email is disabled.
    pub fn mailer(&self) -> Result<Option<Arc<dyn EmailDispatcher>>> {
        if !self.config.email.enabled {
            return Ok(None);
        }
        let client = EmailFunctionClient::new(self.fetch_client()?, self.config.email.function.clone());
        Ok(Some(Arc::new(EdgeFunctionMailer::new(client))))
    }

    /// Everything a storefront command needs.
    pub fn storefront(&self) -> Result<Storefront> {
        let cache = self.cache()?;
        let notifier = self.notifier();
        let auth = SessionAdapter::new(
            Arc::new(HttpAuthProvider::new(self.fetch_client()?)),
            self.remote(None)?,
            cache.clone(),
            notifier.clone(),
        );
        let remote = self.remote(auth.access_token())?;
        let cart = CartStore::open(cache.clone(), notifier.clone(), self.config.currency()?);

        Ok(Storefront {
            cache,
            remote,
            auth,
            cart,
            notifier,
        })
    }
}

/// Services wired for one invocation.
pub struct Storefront {
    pub cache: Cache,
    pub remote: RemoteStore,
    pub auth: SessionAdapter,
    pub cart: CartStore,
    pub notifier: Arc<dyn Notifier>,
}

/// Find a config file in the directory tree.
pub fn find_config(start: &Path) -> Option<(PathBuf, CliConfig)> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                match CliConfig::load(config_path.to_str()?) {
                    Ok(config) => return Some((config_path, config)),
                    Err(e) => tracing::warn!(path = %config_path.display(), error = %format!("{:#}", e), "skipping unreadable config"),
                }
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("craft.toml"),
            "[store]\ncatalog_ttl_secs = 60\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (path, config) = find_config(&nested).unwrap();
        assert_eq!(path, dir.path().join("craft.toml"));
        assert_eq!(config.store.catalog_ttl_secs, 60);
    }

    #[test]
    fn test_hidden_config_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".craft.toml"), "[email]\nenabled = false\n").unwrap();

        let (_, config) = find_config(dir.path()).unwrap();
        assert!(!config.email.enabled);
    }

    #[test]
    fn test_storage_path_is_relative_to_cwd() {
        let ctx = Context {
            config: CliConfig::default(),
            config_path: None,
            output: Output::new(false, false),
            cwd: PathBuf::from("/srv/shop"),
        };
        assert_eq!(ctx.storage_path(), PathBuf::from("/srv/shop/.craft/state.json"));
        assert!(ctx.fetch_client().is_err());
    }
}
