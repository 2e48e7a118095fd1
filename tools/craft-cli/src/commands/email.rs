//! Email service health.

use anyhow::{Context as _, Result};
use craft_data::EmailFunctionClient;

use crate::context::Context;

/// Run the email-status command.
pub async fn run(ctx: &Context) -> Result<()> {
    let client = EmailFunctionClient::new(ctx.fetch_client()?, ctx.config.email.function.clone());

    let spinner = ctx.output.spinner("Checking email service...");
    let status = client.status().await;
    spinner.finish_and_clear();
    let status = status.with_context(|| format!("Email service unreachable at {}", client.endpoint()))?;

    if ctx.output.is_json() {
        ctx.output.json(&status);
        return Ok(());
    }

    ctx.output.header("Email service");
    ctx.output.kv("endpoint", &client.endpoint());
    ctx.output.kv("healthy", &status.success.to_string());
    ctx.output
        .kv("provider key", if status.resend_key_configured { "configured" } else { "missing" });
    if let Some(ref owner) = status.owner_email {
        ctx.output.kv("owner", owner);
    }
    if let Some(ref message) = status.message {
        ctx.output.kv("message", message);
    }
    if !ctx.config.email.enabled {
        ctx.output.warn("Order emails are disabled in the config ([email] enabled = false).");
    }

    Ok(())
}
