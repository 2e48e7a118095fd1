//! Shopping cart module.
//!
//! Contains the pricing resolver, the cart and its persisted store, and
//! promocode evaluation.

mod cart;
mod pricing;
mod promocode;
mod store;

pub use cart::{Cart, LineItem, ProductSnapshot, MAX_QUANTITY_PER_ITEM};
pub use pricing::{resolve_price, CartPricing};
pub use promocode::{
    DiscountKind, Promocode, PromocodeEvaluator, PromocodeOutcome, PromocodeRecord, PromocodeRejection,
};
pub use store::CartStore;
