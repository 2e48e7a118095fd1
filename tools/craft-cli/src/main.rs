//! Craft CLI - Command line storefront for CoffeeCraft.
//!
//! Commands:
//! - `craft products` - Browse the catalog
//! - `craft regions` - List shipping regions
//! - `craft cart` - Show and edit the cart
//! - `craft promo` - Apply or remove a promocode
//! - `craft checkout` - Place an order
//! - `craft orders` - Order history
//! - `craft auth` - Sign in, sign up, sign out
//! - `craft email-status` - Check the email service
//! - `craft config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{AuthArgs, CartArgs, CheckoutArgs, ConfigArgs, OrdersArgs, ProductsArgs, PromoArgs};

/// Craft CLI - Order specialty coffee from the terminal
#[derive(Parser)]
#[command(name = "craft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Products(ProductsArgs),

    /// List shipping regions and fees
    Regions,

    /// Show or edit the cart
    Cart(CartArgs),

    /// Apply or remove a promocode
    Promo(PromoArgs),

    /// Place an order for the cart
    Checkout(CheckoutArgs),

    /// Show your orders
    Orders(OrdersArgs),

    /// Manage your account
    Auth(AuthArgs),

    /// Check the order email service
    EmailStatus,

    /// Manage configuration
    Config(ConfigArgs),
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(verbose)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("failed to initialize logging: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Products(args) => commands::catalog::run(args, &ctx).await,
        Commands::Regions => commands::catalog::regions(&ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Promo(args) => commands::promo::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Orders(args) => commands::orders::run(args, &ctx).await,
        Commands::Auth(args) => commands::auth::run(args, &ctx).await,
        Commands::EmailStatus => commands::email::run(&ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
