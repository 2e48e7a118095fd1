//! Cart commands.

use anyhow::{anyhow, Context as _, Result};
use craft_commerce::cart::CartStore;
use craft_commerce::catalog::Size;
use craft_commerce::{CommerceError, ProductId};

use super::{CartArgs, CartCommand};
use crate::context::Context;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let mut store = ctx.storefront()?;
    let cart = &mut store.cart;

    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => {}
        CartCommand::Add {
            product,
            size,
            quantity,
        } => {
            let size = parse_size(&size)?;
            let id = ProductId::new(product);
            let product = store
                .remote
                .product(&id)
                .await
                .context("Failed to load product")?
                .ok_or_else(|| CommerceError::ProductNotFound(id.to_string()))?;
            cart.add_to_cart(&product, size, quantity)?;
        }
        CartCommand::Update {
            product,
            size,
            quantity,
        } => {
            cart.update_cart_quantity(&ProductId::new(product), parse_size(&size)?, quantity)?;
        }
        CartCommand::Remove { product, size } => {
            cart.remove_from_cart(&ProductId::new(product), parse_size(&size)?)?;
        }
        CartCommand::Clear => {
            cart.clear_cart()?;
        }
    }

    show(cart, ctx);
    Ok(())
}

/// Parse a size name.
pub fn parse_size(s: &str) -> Result<Size> {
    Size::from_str(s).ok_or_else(|| anyhow!("Unknown size '{}'. Use small, medium or large.", s))
}

/// Print the cart with its totals.
pub fn show(cart: &CartStore, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "lines": cart.lines(),
            "promocode": cart.promocode().map(|p| &p.code),
            "pricing": cart.pricing(),
        }));
        return;
    }

    ctx.output.header("Cart");
    if cart.is_empty() {
        ctx.output.info("Your cart is empty");
        return;
    }

    let widths = [28, 8, 5, 12, 12];
    ctx.output
        .table_row(&["PRODUCT", "SIZE", "QTY", "PRICE", "TOTAL"], &widths);
    for line in cart.lines() {
        let quantity = line.quantity.to_string();
        let price = cart.money(line.unit_price).display();
        let total = cart.money(line.line_total()).display();
        ctx.output.table_row(
            &[&line.product.name, line.size.as_str(), &quantity, &price, &total],
            &widths,
        );
    }

    let pricing = cart.pricing();
    println!();
    ctx.output.kv("Items", &cart.item_count().to_string());
    ctx.output.kv("Subtotal", &pricing.subtotal_money().display());
    if let Some(promocode) = cart.promocode() {
        let discount = if pricing.discount.is_zero() {
            format!("{} (not eligible for this cart)", promocode.code)
        } else {
            format!("-{} ({})", pricing.discount_money().display(), promocode.code)
        };
        ctx.output.kv("Discount", &discount);
    }
    ctx.output.kv("Total", &cart.money(cart.cart_total()).display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("Large").unwrap(), Size::Large);
        assert_eq!(parse_size("s").unwrap(), Size::Small);
        assert!(parse_size("venti").is_err());
    }
}
