//! Order history.

use anyhow::{bail, Result};
use craft_commerce::checkout::OrderHistory;
use craft_commerce::Money;

use super::OrdersArgs;
use crate::context::Context;
use crate::output::status_badge;

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let Some(user) = store.auth.user() else {
        bail!("Sign in to see your orders: craft auth signin --email <email>");
    };
    let currency = ctx.config.currency()?;

    let spinner = ctx.output.spinner("Loading orders...");
    let orders = OrderHistory::new(store.remote.clone()).fetch(&user.id).await;
    spinner.finish_and_clear();
    let mut orders = orders?;

    if let Some(limit) = args.limit {
        orders.truncate(limit);
    }

    if ctx.output.is_json() {
        ctx.output.json(&orders);
        return Ok(());
    }

    if orders.is_empty() {
        ctx.output.info("No orders yet.");
        return Ok(());
    }

    ctx.output.header("Your orders");
    let widths = [38, 18, 6, 12, 12];
    ctx.output
        .table_row(&["ORDER", "PLACED", "ITEMS", "TOTAL", "STATUS"], &widths);
    for summary in &orders {
        let order = &summary.order;
        let placed = order
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let items = summary.item_count().to_string();
        let total = Money::new(order.total_price, currency).display();
        let status = status_badge(order.status);
        ctx.output.table_row(
            &[order.id.as_str(), &placed, &items, &total, &status],
            &widths,
        );
    }

    Ok(())
}
