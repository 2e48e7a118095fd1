//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod email;
pub mod orders;
pub mod promo;

use clap::{Args, Subcommand};

/// Arguments for the products command.
#[derive(Args)]
pub struct ProductsArgs {
    /// Only show products in this category.
    #[arg(long)]
    pub category: Option<String>,

    /// List categories instead of products.
    #[arg(long)]
    pub categories: bool,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart.
    Show,
    /// Add a product.
    Add {
        /// Product ID.
        product: String,
        /// Size (small, medium, large).
        #[arg(short, long, default_value = "medium")]
        size: String,
        /// Quantity to add.
        #[arg(short, long, default_value = "1")]
        quantity: i64,
    },
    /// Set the quantity of a line; zero removes it.
    Update {
        /// Product ID.
        product: String,
        /// Size of the line.
        #[arg(short, long, default_value = "medium")]
        size: String,
        /// New quantity.
        quantity: i64,
    },
    /// Remove a line.
    Remove {
        /// Product ID.
        product: String,
        /// Size of the line.
        #[arg(short, long, default_value = "medium")]
        size: String,
    },
    /// Empty the cart.
    Clear,
}

/// Arguments for the promo command.
#[derive(Args)]
pub struct PromoArgs {
    #[command(subcommand)]
    pub command: PromoCommand,
}

#[derive(Subcommand)]
pub enum PromoCommand {
    /// Apply a promocode to the cart.
    Apply {
        /// The code.
        code: String,
    },
    /// Remove the applied promocode.
    Remove,
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Shipping region ID.
    #[arg(short, long)]
    pub region: Option<String>,

    /// Full name.
    #[arg(long)]
    pub name: Option<String>,

    /// Email address.
    #[arg(long)]
    pub email: Option<String>,

    /// Phone number.
    #[arg(long)]
    pub phone: Option<String>,

    /// Street address.
    #[arg(long)]
    pub address: Option<String>,

    /// City.
    #[arg(long)]
    pub city: Option<String>,

    /// Notes for the courier.
    #[arg(long)]
    pub notes: Option<String>,

    /// Place the order without prompting.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    /// Show only the last N orders.
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the auth command.
#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Sign in with email and password.
    Signin {
        /// Account email.
        #[arg(short, long)]
        email: String,
        /// Password; prompted for when omitted.
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account.
    Signup {
        /// Account email.
        #[arg(short, long)]
        email: String,
        /// Password; prompted for when omitted.
        #[arg(short, long)]
        password: Option<String>,
        /// Full name.
        #[arg(long)]
        name: Option<String>,
        /// Phone number.
        #[arg(long)]
        phone: Option<String>,
        /// Street address.
        #[arg(long)]
        address: Option<String>,
        /// City.
        #[arg(long)]
        city: Option<String>,
    },
    /// Sign out.
    Signout,
    /// Show the signed-in user.
    Whoami,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Set a configuration value.
    Set {
        /// Config key (e.g. backend.url).
        key: String,
        /// Value to set.
        value: String,
    },
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}
