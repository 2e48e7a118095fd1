//! Checkout command.

use anyhow::{bail, Context as _, Result};
use console::Term;
use craft_commerce::checkout::{Checkout, ShippingForm};
use craft_commerce::{CommerceError, Profile, RegionId};
use dialoguer::{Confirm, Input, Select};

use super::CheckoutArgs;
use crate::context::Context;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.storefront()?;
    if store.cart.is_empty() {
        bail!("Your cart is empty");
    }
    let interactive = !ctx.output.is_json() && Term::stdout().is_term();

    let mut checkout = Checkout::new(store.remote.clone(), store.notifier.clone());
    if let Some(mailer) = ctx.mailer()? {
        checkout = checkout.with_mailer(mailer);
    }
    if let Some(ref owner) = ctx.config.email.owner {
        checkout = checkout.with_owner_email(owner.clone());
    }

    let spinner = ctx.output.spinner("Loading shipping regions...");
    let loaded = checkout.load_regions().await.map(|r| r.len());
    spinner.finish_and_clear();
    loaded?;

    // Signed-in customers start from their saved profile.
    let user = store.auth.user();
    let profile = match user.as_ref() {
        Some(user) => match store.auth.profile().await {
            Ok(profile) => profile.unwrap_or_else(|| Profile::new(user.id.clone())),
            Err(e) => {
                tracing::warn!(error = %e, "could not load profile");
                Profile::new(user.id.clone())
            }
        },
        None => Profile::default(),
    };
    let mut form = ShippingForm::from_profile(&profile, user.as_ref().and_then(|u| u.email.as_deref()));
    apply_args(&mut form, &args);

    let region = match args.region.clone().or_else(|| profile.region.as_ref().map(|r| r.to_string())) {
        Some(region) => Some(region),
        None if interactive => prompt_region(&checkout)?,
        None => None,
    };
    if let Some(region) = region {
        checkout.select_region(&RegionId::new(region))?;
    }

    if interactive {
        prompt_missing(&mut form)?;
    }

    if let Err(e) = checkout.validate(&form) {
        if let CommerceError::Validation(ref errors) = e {
            ctx.output.field_errors(errors);
        }
        return Err(e.into());
    }

    let pricing = checkout.pricing(&store.cart);
    if !ctx.output.is_json() {
        ctx.output.header("Order summary");
        ctx.output.kv("Subtotal", &pricing.subtotal_money().display());
        if !pricing.discount.is_zero() {
            ctx.output.kv("Discount", &format!("-{}", pricing.discount_money().display()));
        }
        if let Some(region) = checkout.selected_region() {
            ctx.output.kv(
                &format!("Shipping ({})", region.name),
                &pricing.shipping_money().display(),
            );
        }
        ctx.output.kv("Total", &pricing.grand_total_money().display());
        ctx.output.kv("Payment", form.payment_method.display_name());
        ctx.output.kv("Deliver to", &form.to_address().one_line());
    }

    if interactive && !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Place this order?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            ctx.output.info("Order not placed.");
            return Ok(());
        }
    }

    let spinner = ctx.output.spinner("Placing order...");
    let result = checkout
        .submit(&mut store.cart, user.as_ref().map(|u| &u.id))
        .await;
    spinner.finish_and_clear();
    let confirmation = result?;

    if ctx.output.is_json() {
        ctx.output.json(&confirmation);
        return Ok(());
    }

    ctx.output.kv("Order number", &confirmation.order_number);
    ctx.output.kv("Order ID", confirmation.order_id.as_str());
    ctx.output.kv("Total", &confirmation.grand_total_money().display());
    for report in &confirmation.emails {
        match (report.sent, report.error.as_deref()) {
            (true, _) => ctx.output.kv(&format!("{} email", report.kind), "sent"),
            (false, error) => ctx.output.warn(&format!(
                "{} email not sent: {}",
                report.kind,
                error.unwrap_or("unknown error")
            )),
        }
    }
    if confirmation.promocode.is_some() && !confirmation.promocode_recorded {
        tracing::debug!(order_id = %confirmation.order_id, "promocode usage was not recorded");
    }

    Ok(())
}

fn apply_args(form: &mut ShippingForm, args: &CheckoutArgs) {
    let fields = [
        (&mut form.full_name, &args.name),
        (&mut form.email, &args.email),
        (&mut form.phone, &args.phone),
        (&mut form.address, &args.address),
        (&mut form.city, &args.city),
    ];
    for (target, value) in fields {
        if let Some(value) = value {
            *target = value.clone();
        }
    }
    if args.notes.is_some() {
        form.notes = args.notes.clone();
    }
}

fn prompt_region(checkout: &Checkout) -> Result<Option<String>> {
    let regions = checkout.regions();
    if regions.is_empty() {
        return Ok(None);
    }
    let items: Vec<String> = regions
        .iter()
        .map(|r| format!("{} ({})", r.name, r.shipping_fee))
        .collect();
    let choice = Select::new()
        .with_prompt("Shipping region")
        .items(&items)
        .default(0)
        .interact_opt()
        .context("Failed to read shipping region")?;
    Ok(choice.map(|i| regions[i].id.to_string()))
}

fn prompt_missing(form: &mut ShippingForm) -> Result<()> {
    let fields = [
        ("Full name", &mut form.full_name),
        ("Email", &mut form.email),
        ("Phone", &mut form.phone),
        ("Address", &mut form.address),
        ("City", &mut form.city),
    ];
    for (label, value) in fields {
        if value.trim().is_empty() {
            *value = Input::<String>::new()
                .with_prompt(label)
                .allow_empty(true)
                .interact_text()
                .with_context(|| format!("Failed to read {}", label.to_lowercase()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_profile() {
        let profile = Profile::new("u1").with_full_name("Mona").with_city("Cairo");
        let mut form = ShippingForm::from_profile(&profile, Some("mona@example.com"));
        let args = CheckoutArgs {
            region: None,
            name: None,
            email: None,
            phone: Some("0100".into()),
            address: Some("12 Tahrir St".into()),
            city: Some("Giza".into()),
            notes: Some("Ring twice".into()),
            yes: true,
        };
        apply_args(&mut form, &args);

        assert_eq!(form.full_name, "Mona");
        assert_eq!(form.email, "mona@example.com");
        assert_eq!(form.city, "Giza");
        assert_eq!(form.notes.as_deref(), Some("Ring twice"));
        assert!(form.check().is_empty());
    }
}
