//! Shipping region types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CommerceError;
use crate::ids::RegionId;
use crate::money::{Currency, Money};

/// A named delivery area with a flat shipping fee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingRegion {
    /// Unique identifier.
    pub id: RegionId,
    /// Display name.
    pub name: String,
    /// Flat fee charged for delivery to this region.
    pub shipping_fee: Decimal,
    /// Inactive regions are never offered.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ShippingRegion {
    /// Create an active region.
    pub fn new(id: impl Into<RegionId>, name: impl Into<String>, shipping_fee: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shipping_fee,
            is_active: true,
        }
    }

    /// Shipping fee as money.
    pub fn fee(&self, currency: Currency) -> Money {
        Money::new(self.shipping_fee, currency)
    }

    /// Check if delivery here costs nothing.
    pub fn is_free(&self) -> bool {
        self.shipping_fee.is_zero()
    }

    /// Validate a row read from the backend.
    pub fn validated(self) -> Result<Self, CommerceError> {
        if self.name.trim().is_empty() {
            return Err(CommerceError::InvalidRecord {
                table: "shipping_regions",
                reason: format!("region {} has no name", self.id),
            });
        }
        if self.shipping_fee < Decimal::ZERO {
            return Err(CommerceError::InvalidRecord {
                table: "shipping_regions",
                reason: format!("region {} has a negative fee", self.id),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_row() {
        let region: ShippingRegion = serde_json::from_value(serde_json::json!({
            "id": 3, "name": "Giza", "shipping_fee": 60
        }))
        .unwrap();

        assert_eq!(region.id.as_str(), "3");
        assert!(region.is_active);
        assert_eq!(region.fee(Currency::EGP).display(), "EGP60.00");
        assert!(region.validated().is_ok());
    }

    #[test]
    fn test_negative_fee_rejected() {
        let region = ShippingRegion::new("r1", "Cairo", Decimal::new(-5, 0));
        assert!(matches!(
            region.validated(),
            Err(CommerceError::InvalidRecord { table: "shipping_regions", .. })
        ));
    }
}
