//! Session cart with durable persistence.

use std::sync::Arc;

use chrono::Utc;
use craft_cache::{cache_key, Cache};
use rust_decimal::Decimal;

use crate::cart::{Cart, CartPricing, LineItem, Promocode};
use crate::catalog::{Product, Size};
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};
use crate::notify::{Notification, Notifier};

/// The session cart.
///
/// Every mutation is applied to a copy, written to the durable cache, and
/// only then swapped in, so the in-memory cart and the stored cart are the
/// same whenever a call returns. A failed write leaves both untouched.
pub struct CartStore {
    cart: Cart,
    cache: Cache,
    notifier: Arc<dyn Notifier>,
    currency: Currency,
}

impl CartStore {
    /// Storage key of the persisted cart.
    pub fn storage_key() -> String {
        cache_key!("cart", "state")
    }

    /// Open the store, rehydrating any cart persisted by an earlier session.
    ///
    /// A stored cart that no longer parses is discarded with a warning.
    pub fn open(cache: Cache, notifier: Arc<dyn Notifier>, currency: Currency) -> Self {
        let cart = match cache.get::<Cart>(&Self::storage_key()) {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable persisted cart");
                Cart::new()
            }
        };
        tracing::debug!(lines = cart.lines.len(), "cart rehydrated");

        Self {
            cart,
            cache,
            notifier,
            currency,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.cart.lines
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn promocode(&self) -> Option<&Promocode> {
        self.cart.promocode.as_ref()
    }

    fn commit<R>(&mut self, mutate: impl FnOnce(&mut Cart) -> Result<R, CommerceError>) -> Result<R, CommerceError> {
        let mut next = self.cart.clone();
        let result = mutate(&mut next)?;
        self.cache.set(&Self::storage_key(), &next)?;
        self.cart = next;
        Ok(result)
    }

    /// Add a product to the cart.
    pub fn add_to_cart(&mut self, product: &Product, size: Size, quantity: i64) -> Result<(), CommerceError> {
        self.commit(|cart| cart.add_item(product, size, quantity))?;
        tracing::info!(product_id = %product.id, size = %size, quantity, "added to cart");
        self.notifier
            .notify(Notification::success("Product added to cart!"));
        Ok(())
    }

    /// Remove a line. Absent lines are not an error.
    pub fn remove_from_cart(&mut self, product_id: &ProductId, size: Size) -> Result<(), CommerceError> {
        let removed = self.commit(|cart| Ok(cart.remove_item(product_id, size)))?;
        tracing::info!(product_id = %product_id, size = %size, removed, "removed from cart");
        self.notifier
            .notify(Notification::info("Product removed from cart"));
        Ok(())
    }

    /// Set a line's quantity; zero or less removes it.
    pub fn update_cart_quantity(&mut self, product_id: &ProductId, size: Size, quantity: i64) -> Result<(), CommerceError> {
        if quantity <= 0 {
            return self.remove_from_cart(product_id, size);
        }
        let updated = self.commit(|cart| cart.update_quantity(product_id, size, quantity))?;
        tracing::debug!(product_id = %product_id, size = %size, quantity, updated, "cart quantity updated");
        Ok(())
    }

    /// Empty the cart and drop the promocode.
    pub fn clear_cart(&mut self) -> Result<(), CommerceError> {
        self.commit(|cart| {
            cart.clear();
            Ok(())
        })?;
        tracing::debug!("cart cleared");
        Ok(())
    }

    /// Store an accepted promocode, replacing any previous one.
    pub fn set_promocode(&mut self, promocode: Promocode) -> Result<(), CommerceError> {
        self.commit(|cart| {
            cart.promocode = Some(promocode);
            Ok(())
        })
    }

    /// Drop the promocode unconditionally.
    pub fn remove_promocode(&mut self) -> Result<(), CommerceError> {
        let had_code = self.commit(|cart| Ok(cart.promocode.take().is_some()))?;
        if had_code {
            self.notifier.notify(Notification::info("Promocode removed"));
        }
        Ok(())
    }

    /// Sum of unit price times quantity.
    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    /// Current promocode discount, zero when the code no longer qualifies.
    pub fn discount_amount(&self) -> Decimal {
        self.cart.discount_at(Utc::now())
    }

    /// Subtotal minus the discount.
    pub fn cart_total(&self) -> Decimal {
        self.pricing().cart_total()
    }

    /// Total quantity, for the badge.
    pub fn item_count(&self) -> i64 {
        self.cart.item_count()
    }

    pub fn pricing(&self) -> CartPricing {
        self.cart.pricing_at(Utc::now(), self.currency)
    }

    pub fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.currency)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("currency", &self.currency)
            .finish()
    }
}
