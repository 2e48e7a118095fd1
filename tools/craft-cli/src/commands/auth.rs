//! Account commands.

use anyhow::{bail, Context as _, Result};
use console::Term;
use craft_commerce::Profile;
use dialoguer::Password;

use super::{AuthArgs, AuthCommand};
use crate::context::Context;

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Signin { email, password } => sign_in(&email, password, ctx).await,
        AuthCommand::Signup {
            email,
            password,
            name,
            phone,
            address,
            city,
        } => {
            let mut profile = Profile::default();
            profile.full_name = name;
            profile.phone = phone;
            profile.address = address;
            profile.city = city;
            sign_up(&email, password, profile, ctx).await
        }
        AuthCommand::Signout => sign_out(ctx).await,
        AuthCommand::Whoami => whoami(ctx).await,
    }
}

fn read_password(password: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    if !Term::stderr().is_term() {
        bail!("No password given. Pass --password or run interactively.");
    }

    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt.interact().context("Failed to read password")
}

async fn sign_in(email: &str, password: Option<String>, ctx: &Context) -> Result<()> {
    let password = read_password(password, false)?;
    let store = ctx.storefront()?;

    let spinner = ctx.output.spinner("Signing in...");
    let result = store.auth.sign_in(email, &password).await;
    spinner.finish_and_clear();
    let session = result?;

    if ctx.output.is_json() {
        ctx.output.json(&session.user);
    } else {
        ctx.output
            .kv("Signed in as", session.user.email_or_default());
    }
    Ok(())
}

async fn sign_up(email: &str, password: Option<String>, profile: Profile, ctx: &Context) -> Result<()> {
    let password = read_password(password, true)?;
    let store = ctx.storefront()?;

    let spinner = ctx.output.spinner("Creating account...");
    let result = store.auth.sign_up(email, &password, profile).await;
    spinner.finish_and_clear();
    let outcome = result?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "user": outcome.user,
            "signedIn": outcome.signed_in,
            "profileSaved": outcome.profile_saved,
        }));
        return Ok(());
    }

    if !outcome.signed_in {
        ctx.output
            .info("Check your inbox to confirm your email, then sign in.");
    }
    if !outcome.profile_saved {
        ctx.output
            .warn("Your profile details were not saved; they can be entered at checkout.");
    }
    Ok(())
}

async fn sign_out(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    if !store.auth.is_signed_in() {
        ctx.output.info("Not signed in.");
        return Ok(());
    }
    store.auth.sign_out().await;
    Ok(())
}

async fn whoami(ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let Some(user) = store.auth.user() else {
        if ctx.output.is_json() {
            ctx.output.json(&serde_json::Value::Null);
        } else {
            ctx.output.info("Not signed in.");
        }
        return Ok(());
    };

    let profile = match store.auth.profile().await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, "could not load profile");
            None
        }
    };

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "user": user, "profile": profile }));
        return Ok(());
    }

    ctx.output.kv("Email", user.email_or_default());
    ctx.output.kv("User ID", user.id.as_str());
    ctx.output
        .kv("Confirmed", if user.is_confirmed() { "yes" } else { "no" });
    if let Some(profile) = profile {
        let fields = [
            ("Name", profile.full_name),
            ("Phone", profile.phone),
            ("Address", profile.address),
            ("City", profile.city),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                ctx.output.kv(label, &value);
            }
        }
    }
    Ok(())
}
