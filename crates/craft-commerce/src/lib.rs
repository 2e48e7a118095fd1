//! Storefront core for CoffeeCraft.
//!
//! - **Catalog**: products with size tiers, categories, a TTL cache
//! - **Cart**: price resolution, a persisted session cart, promocodes
//! - **Checkout**: shipping regions, form validation, order placement
//!   with compensation, order history
//! - **Email**: best-effort transactional order emails
//!
//! Collaborators are passed in explicitly: a [`RemoteStore`] over the
//! backend tables, a [`craft_cache::Cache`] for the durable cart, a
//! [`Notifier`] for user-facing messages and, optionally, an
//! [`EmailDispatcher`].
//!
//! # Example
//!
//! ```rust,ignore
//! use craft_commerce::prelude::*;
//!
//! let remote = RemoteStore::new(db, TimeoutConfig::default());
//! let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
//! let mut cart = CartStore::open(cache, notifier.clone(), Currency::EGP);
//!
//! cart.add_to_cart(&product, Size::Medium, 2)?;
//! PromocodeEvaluator::new(remote.clone(), notifier.clone())
//!     .apply(&mut cart, "SAVE10")
//!     .await?;
//!
//! let mut checkout = Checkout::new(remote, notifier);
//! checkout.load_regions().await?;
//! checkout.select_region(&RegionId::new("giza"))?;
//! checkout.validate(&form)?;
//! let confirmation = checkout.submit(&mut cart, None).await?;
//! println!("{} {}", confirmation.order_number, confirmation.grand_total_money());
//! ```

pub mod error;
pub mod ids;
pub mod money;
pub mod notify;
pub mod profile;
pub mod remote;

pub mod catalog;
pub mod cart;
pub mod checkout;
pub mod email;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};
pub use notify::{Notification, NotificationLevel, NotificationLog, Notifier, TracingNotifier};
pub use profile::Profile;
pub use remote::RemoteStore;
pub use email::EmailDispatcher;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::notify::{Notification, NotificationLevel, NotificationLog, Notifier, TracingNotifier};
    pub use crate::profile::Profile;
    pub use crate::remote::RemoteStore;

    // Catalog
    pub use crate::catalog::{CatalogCache, Category, Product, Size};

    // Cart
    pub use crate::cart::{
        resolve_price, Cart, CartPricing, CartStore, DiscountKind, LineItem, Promocode, PromocodeEvaluator,
        PromocodeOutcome, PromocodeRejection,
    };

    // Checkout
    pub use crate::checkout::{
        Checkout, CheckoutState, Field, FieldErrors, OrderConfirmation, OrderHistory, OrderStatus, OrderSummary,
        PaymentMethod, ShippingAddress, ShippingForm, ShippingRegion,
    };

    // Email
    pub use crate::email::{Delivery, EdgeFunctionMailer, EmailDispatcher, EmailReport, OrderEmail};

    pub use craft_data::TimeoutConfig;
}
