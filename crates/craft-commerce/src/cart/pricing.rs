//! Price resolution and cart totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, Size};
use crate::money::{Currency, Money};

/// Resolve the unit price of a product in a size.
///
/// The size tier's own price wins when the product has one; otherwise the
/// base price applies. A missing tier never fails an add-to-cart.
pub fn resolve_price(product: &Product, size: Size) -> Decimal {
    product.tier_price(size).unwrap_or(product.price)
}

/// Calculated totals for a cart, optionally with shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartPricing {
    /// Sum of unit price times quantity over all lines.
    pub subtotal: Decimal,
    /// Promocode discount, never above the subtotal.
    pub discount: Decimal,
    /// Shipping fee of the selected region, zero before one is chosen.
    pub shipping: Decimal,
    /// Subtotal minus discount plus shipping.
    pub grand_total: Decimal,
    /// Currency of every amount.
    pub currency: Currency,
}

impl CartPricing {
    /// Compute totals. The discount is clamped to `[0, subtotal]`.
    pub fn compute(subtotal: Decimal, discount: Decimal, shipping: Decimal, currency: Currency) -> Self {
        let discount = discount.max(Decimal::ZERO).min(subtotal);
        Self {
            subtotal,
            discount,
            shipping,
            grand_total: subtotal - discount + shipping,
            currency,
        }
    }

    /// Subtotal after discount, before shipping.
    pub fn cart_total(&self) -> Decimal {
        self.subtotal - self.discount
    }

    /// Same totals with a shipping fee applied.
    pub fn with_shipping(&self, shipping: Decimal) -> Self {
        Self::compute(self.subtotal, self.discount, shipping, self.currency)
    }

    pub fn subtotal_money(&self) -> Money {
        Money::new(self.subtotal, self.currency)
    }

    pub fn discount_money(&self) -> Money {
        Money::new(self.discount, self.currency)
    }

    pub fn shipping_money(&self) -> Money {
        Money::new(self.shipping, self.currency)
    }

    pub fn grand_total_money(&self) -> Money {
        Money::new(self.grand_total, self.currency)
    }
}
