//! Product and size types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CommerceError;
use crate::ids::ProductId;

/// Cup or bag size a product is sold in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

impl Size {
    /// All sizes, smallest first.
    pub const ALL: [Size; 3] = [Size::Small, Size::Medium, Size::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Some(Size::Small),
            "medium" | "m" => Some(Size::Medium),
            "large" | "l" => Some(Size::Large),
            _ => None,
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: Option<String>,
    /// Category name.
    pub category: Option<String>,
    /// Primary image.
    pub image_url: Option<String>,
    /// Base price, used when a size tier has no price of its own.
    pub price: Decimal,
    /// Price of the small size.
    pub price_small: Option<Decimal>,
    /// Price of the medium size.
    pub price_medium: Option<Decimal>,
    /// Price of the large size.
    pub price_large: Option<Decimal>,
    /// Whether the product can be ordered.
    pub in_stock: bool,
}

impl Product {
    /// Create a product with only a base price.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            category: None,
            image_url: None,
            price,
            price_small: None,
            price_medium: None,
            price_large: None,
            in_stock: true,
        }
    }

    /// Set the price of one size tier.
    pub fn with_tier(mut self, size: Size, price: Decimal) -> Self {
        match size {
            Size::Small => self.price_small = Some(price),
            Size::Medium => self.price_medium = Some(price),
            Size::Large => self.price_large = Some(price),
        }
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the image.
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// The price stored for one size tier, if any.
    pub fn tier_price(&self, size: Size) -> Option<Decimal> {
        match size {
            Size::Small => self.price_small,
            Size::Medium => self.price_medium,
            Size::Large => self.price_large,
        }
    }
}

/// A `products` row as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub price_small: Option<Decimal>,
    #[serde(default)]
    pub price_medium: Option<Decimal>,
    #[serde(default)]
    pub price_large: Option<Decimal>,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = CommerceError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: String| CommerceError::InvalidRecord {
            table: "products",
            reason,
        };

        if record.name.trim().is_empty() {
            return Err(invalid(format!("product {} has no name", record.id)));
        }
        if record.price.is_sign_negative() && !record.price.is_zero() {
            return Err(invalid(format!("product {} has a negative price", record.id)));
        }
        for (size, tier) in [
            (Size::Small, record.price_small),
            (Size::Medium, record.price_medium),
            (Size::Large, record.price_large),
        ] {
            if tier.is_some_and(|p| p.is_sign_negative() && !p.is_zero()) {
                return Err(invalid(format!(
                    "product {} has a negative {} price",
                    record.id, size
                )));
            }
        }

        Ok(Product {
            id: record.id,
            name: record.name,
            description: record.description,
            category: record.category,
            image_url: record.image_url,
            price: record.price,
            price_small: record.price_small,
            price_medium: record.price_medium,
            price_large: record.price_large,
            in_stock: record.in_stock.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_size_parsing() {
        assert_eq!(Size::from_str("small"), Some(Size::Small));
        assert_eq!(Size::from_str("L"), Some(Size::Large));
        assert_eq!(Size::from_str("venti"), None);
        assert_eq!(Size::default(), Size::Medium);
    }

    #[test]
    fn test_record_from_backend_json() {
        let record: ProductRecord = serde_json::from_value(json!({
            "id": "p1",
            "name": "Ethiopian Yirgacheffe",
            "price": 22.5,
            "price_small": null,
            "price_medium": "24.99",
            "category": "Single Origin",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let product = Product::try_from(record).unwrap();
        assert_eq!(product.price, Decimal::new(225, 1));
        assert_eq!(product.tier_price(Size::Medium), Some(Decimal::new(2499, 2)));
        assert_eq!(product.tier_price(Size::Small), None);
        assert!(product.in_stock);
    }

    #[test]
    fn test_record_validation() {
        let mut record: ProductRecord = serde_json::from_value(json!({
            "id": "p1", "name": "  ", "price": 10
        }))
        .unwrap();
        assert!(matches!(
            Product::try_from(record.clone()),
            Err(CommerceError::InvalidRecord { table: "products", .. })
        ));

        record.name = "Espresso".into();
        record.price_large = Some(Decimal::new(-1, 0));
        assert!(Product::try_from(record).is_err());
    }
}
