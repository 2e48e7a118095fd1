//! Cart and line item types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{resolve_price, CartPricing, Promocode};
use crate::catalog::{Product, Size};
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Currency;

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// Product details copied into the cart when a line is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            category: product.category.clone(),
        }
    }
}

/// One (product, size) entry in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub product_id: ProductId,
    pub size: Size,
    /// Always at least 1.
    pub quantity: i64,
    /// Resolved when the line was created and never re-priced.
    pub unit_price: Decimal,
    pub product: ProductSnapshot,
}

impl LineItem {
    /// Check if this line has the given identity.
    pub fn is(&self, product_id: &ProductId, size: Size) -> bool {
        &self.product_id == product_id && self.size == size
    }

    /// Unit price times quantity.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Cart contents: line items plus the applied promocode.
///
/// Mutations here are pure; persistence and notifications live in
/// [`crate::cart::CartStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    #[serde(default)]
    pub lines: Vec<LineItem>,
    #[serde(default)]
    pub promocode: Option<Promocode>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a product in a size.
    ///
    /// An existing (product, size) line has its quantity increased and keeps
    /// its original unit price. A new line resolves its price now.
    pub fn add_item(&mut self, product: &Product, size: Size, quantity: i64) -> Result<(), CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        if let Some(existing) = self.lines.iter_mut().find(|l| l.is(&product.id, size)) {
            let new_quantity = existing
                .quantity
                .checked_add(quantity)
                .filter(|q| *q <= MAX_QUANTITY_PER_ITEM)
                .ok_or(CommerceError::QuantityExceedsLimit(
                    existing.quantity.saturating_add(quantity),
                    MAX_QUANTITY_PER_ITEM,
                ))?;
            existing.quantity = new_quantity;
            return Ok(());
        }

        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(quantity, MAX_QUANTITY_PER_ITEM));
        }

        self.lines.push(LineItem {
            product_id: product.id.clone(),
            size,
            quantity,
            unit_price: resolve_price(product, size),
            product: ProductSnapshot::from(product),
        });
        Ok(())
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// Returns whether a line was changed.
    pub fn update_quantity(&mut self, product_id: &ProductId, size: Size, quantity: i64) -> Result<bool, CommerceError> {
        if quantity <= 0 {
            return Ok(self.remove_item(product_id, size));
        }
        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(quantity, MAX_QUANTITY_PER_ITEM));
        }

        match self.lines.iter_mut().find(|l| l.is(product_id, size)) {
            Some(line) => {
                line.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove a line. Returns whether it existed.
    pub fn remove_item(&mut self, product_id: &ProductId, size: Size) -> bool {
        let len_before = self.lines.len();
        self.lines.retain(|l| !l.is(product_id, size));
        self.lines.len() < len_before
    }

    /// Empty the cart and drop the promocode.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.promocode = None;
    }

    pub fn find(&self, product_id: &ProductId, size: Size) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.is(product_id, size))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total quantity across lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of unit price times quantity.
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(LineItem::line_total).sum()
    }

    /// Discount of the applied promocode for the live subtotal.
    pub fn discount_at(&self, now: DateTime<Utc>) -> Decimal {
        self.promocode
            .as_ref()
            .map(|p| p.eligible_discount(self.subtotal(), now))
            .unwrap_or(Decimal::ZERO)
    }

    /// The promocode if it still qualifies for the live cart.
    pub fn eligible_promocode_at(&self, now: DateTime<Utc>) -> Option<&Promocode> {
        let subtotal = self.subtotal();
        self.promocode.as_ref().filter(|p| p.is_eligible(subtotal, now))
    }

    /// Totals without shipping.
    pub fn pricing_at(&self, now: DateTime<Utc>, currency: Currency) -> CartPricing {
        CartPricing::compute(self.subtotal(), self.discount_at(now), Decimal::ZERO, currency)
    }
}
