//! Catalog and shipping region listings.

use anyhow::Result;
use craft_commerce::catalog::{CatalogCache, Size};
use craft_commerce::cart::resolve_price;
use craft_commerce::Money;

use super::ProductsArgs;
use crate::context::Context;

/// Run the products command.
pub async fn run(args: ProductsArgs, ctx: &Context) -> Result<()> {
    let catalog = CatalogCache::with_ttl(ctx.remote(None)?, ctx.config.catalog_ttl());
    let currency = ctx.config.currency()?;

    if args.categories {
        let spinner = ctx.output.spinner("Loading categories...");
        let categories = catalog.categories().await;
        spinner.finish_and_clear();
        let categories = categories?;

        if ctx.output.is_json() {
            ctx.output.json(&categories);
            return Ok(());
        }
        ctx.output.header("Categories");
        for category in &categories {
            ctx.output.list_item(&category.name);
        }
        return Ok(());
    }

    let spinner = ctx.output.spinner("Loading products...");
    let products = match args.category.as_deref() {
        Some(category) => catalog.products_in(category).await,
        None => catalog.products().await,
    };
    spinner.finish_and_clear();
    let products = products?;

    if ctx.output.is_json() {
        ctx.output.json(&products);
        return Ok(());
    }

    if products.is_empty() {
        ctx.output.info("No products found.");
        return Ok(());
    }

    ctx.output.header("Products");
    let widths = [14, 28, 12, 10, 10, 10];
    ctx.output
        .table_row(&["ID", "NAME", "CATEGORY", "SMALL", "MEDIUM", "LARGE"], &widths);
    for product in &products {
        let price = |size| Money::new(resolve_price(product, size), currency).display();
        let (small, medium, large) = (price(Size::Small), price(Size::Medium), price(Size::Large));
        ctx.output.table_row(
            &[
                product.id.as_str(),
                &product.name,
                product.category.as_deref().unwrap_or("-"),
                &small,
                &medium,
                &large,
            ],
            &widths,
        );
    }

    Ok(())
}

/// Run the regions command.
pub async fn regions(ctx: &Context) -> Result<()> {
    let remote = ctx.remote(None)?;
    let currency = ctx.config.currency()?;

    let spinner = ctx.output.spinner("Loading shipping regions...");
    let regions = remote.active_regions().await;
    spinner.finish_and_clear();
    let regions = regions?;

    if ctx.output.is_json() {
        ctx.output.json(&regions);
        return Ok(());
    }

    ctx.output.header("Shipping regions");
    let widths = [14, 24, 12];
    ctx.output.table_row(&["ID", "NAME", "FEE"], &widths);
    for region in &regions {
        let fee = if region.is_free() {
            "Free".to_string()
        } else {
            region.fee(currency).display()
        };
        ctx.output
            .table_row(&[region.id.as_str(), &region.name, &fee], &widths);
    }

    Ok(())
}
