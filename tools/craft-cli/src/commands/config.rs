//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Set { key, value } => set_config(&key, &value, ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;
    ctx.output.info("");
    ctx.output.info("[backend]");
    ctx.output
        .kv("url", config.backend.url.as_deref().unwrap_or("(not set)"));
    ctx.output.kv(
        "anon_key",
        if config.backend.anon_key.is_some() { "(set)" } else { "(not set)" },
    );

    ctx.output.info("");
    ctx.output.info("[storage]");
    ctx.output
        .kv("path", &ctx.storage_path().display().to_string());

    ctx.output.info("");
    ctx.output.info("[timeouts]");
    ctx.output.kv("read_ms", &config.timeouts.read_ms.to_string());
    ctx.output.kv("write_ms", &config.timeouts.write_ms.to_string());
    ctx.output.kv("auth_ms", &config.timeouts.auth_ms.to_string());
    ctx.output.kv("email_ms", &config.timeouts.email_ms.to_string());

    ctx.output.info("");
    ctx.output.info("[email]");
    ctx.output.kv("enabled", &config.email.enabled.to_string());
    ctx.output.kv("function", &config.email.function);
    if let Some(ref owner) = config.email.owner {
        ctx.output.kv("owner", owner);
    }

    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("currency", &config.store.currency);
    ctx.output
        .kv("catalog_ttl_secs", &config.store.catalog_ttl_secs.to_string());

    Ok(())
}

fn set_config(key: &str, value: &str, ctx: &Context) -> Result<()> {
    let Some(ref path) = ctx.config_path else {
        bail!("No config file found. Run `craft config init` to create one.");
    };
    let path = path.to_string_lossy().to_string();

    // Reload from disk so environment overrides are not persisted.
    let mut config = CliConfig::load(&path)?;
    set_config_value(&mut config, key, value)?;
    config.save(&path)?;

    ctx.output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output
        .success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn set_config_value(config: &mut CliConfig, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["backend", "url"] => config.backend.url = Some(value.to_string()),
        ["backend", "anon_key"] => config.backend.anon_key = Some(value.to_string()),
        ["storage", "path"] => config.storage.path = value.into(),
        ["timeouts", "read_ms"] => config.timeouts.read_ms = value.parse()?,
        ["timeouts", "write_ms"] => config.timeouts.write_ms = value.parse()?,
        ["timeouts", "auth_ms"] => config.timeouts.auth_ms = value.parse()?,
        ["timeouts", "email_ms"] => config.timeouts.email_ms = value.parse()?,
        ["email", "enabled"] => config.email.enabled = value.parse()?,
        ["email", "function"] => config.email.function = value.to_string(),
        ["email", "owner"] => config.email.owner = Some(value.to_string()),
        ["store", "currency"] => {
            config.store.currency = value.to_uppercase();
            config.currency()?;
        }
        ["store", "catalog_ttl_secs"] => config.store.catalog_ttl_secs = value.parse()?,
        _ => bail!("Unknown config key: {}", key),
    }

    Ok(())
}
