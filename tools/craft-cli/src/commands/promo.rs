//! Promocode commands.

use anyhow::Result;
use craft_commerce::cart::{PromocodeEvaluator, PromocodeOutcome};

use super::{PromoArgs, PromoCommand};
use crate::context::Context;

/// Run the promo command.
pub async fn run(args: PromoArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.storefront()?;

    match args.command {
        PromoCommand::Apply { code } => {
            let evaluator = PromocodeEvaluator::new(store.remote.clone(), store.notifier.clone());
            let spinner = ctx.output.spinner("Checking promocode...");
            let outcome = evaluator.apply(&mut store.cart, &code).await;
            spinner.finish_and_clear();

            match outcome? {
                PromocodeOutcome::Applied(_) => super::cart::show(&store.cart, ctx),
                PromocodeOutcome::Rejected(rejection) => {
                    if ctx.output.is_json() {
                        ctx.output.json(&serde_json::json!({
                            "applied": false,
                            "reason": rejection,
                            "message": rejection.message(store.cart.currency()),
                        }));
                    }
                }
            }
        }
        PromoCommand::Remove => {
            store.cart.remove_promocode()?;
            super::cart::show(&store.cart, ctx);
        }
    }

    Ok(())
}
