//! Shared fixtures for the storefront integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use craft_cache::Cache;
use craft_commerce::prelude::*;
use craft_commerce::remote::tables;
use craft_db::{Db, FaultyStore, MemoryStore, TableStore};
use rust_decimal::Decimal;
use serde_json::json;

pub type Store = FaultyStore<MemoryStore>;

/// Tables a fresh storefront starts with.
pub fn seeded() -> MemoryStore {
    MemoryStore::new()
        .with_rows(
            tables::PRODUCTS,
            [
                json!({
                    "id": "eth", "name": "Ethiopian Yirgacheffe", "category": "Beans",
                    "price": "19.99", "price_medium": "24.99", "price_large": "29.99"
                }),
                json!({"id": "drip", "name": "Drip Bag", "category": "Drip", "price": 5}),
            ],
        )
        .with_rows(
            tables::SHIPPING_REGIONS,
            [
                json!({"id": "giza", "name": "Giza", "shipping_fee": 60, "is_active": true}),
                json!({"id": "cairo", "name": "Cairo", "shipping_fee": 50, "is_active": true}),
            ],
        )
        .with_rows(
            tables::PROMOCODES,
            [
                json!({
                    "id": 7, "code": "SAVE10", "discount_type": "percentage", "discount_value": 10,
                    "used_count": 0, "usage_limit": 100, "is_active": true
                }),
                json!({
                    "id": 8, "code": "FULL", "discount_type": "fixed", "discount_value": 5,
                    "used_count": 3, "usage_limit": 3, "is_active": true
                }),
                json!({
                    "id": 9, "code": "BIGSPEND", "discount_type": "fixed", "discount_value": 20,
                    "min_order_amount": 100, "used_count": 0, "is_active": true
                }),
                json!({
                    "id": 10, "code": "OLD", "discount_type": "percentage", "discount_value": 15,
                    "used_count": 0, "valid_until": "2020-01-01", "is_active": true
                }),
            ],
        )
}

pub fn faulty() -> Arc<Store> {
    Arc::new(FaultyStore::new(seeded()))
}

pub fn remote_over(store: Arc<dyn TableStore>) -> RemoteStore {
    RemoteStore::new(Db::new(store), TimeoutConfig::default())
}

pub fn ethiopian() -> Product {
    Product::new("eth", "Ethiopian Yirgacheffe", Decimal::new(1999, 2))
        .with_tier(Size::Medium, Decimal::new(2499, 2))
        .with_tier(Size::Large, Decimal::new(2999, 2))
        .with_category("Beans")
}

/// Two medium Ethiopians: subtotal 49.98.
pub fn cart_with_ethiopian(log: Arc<NotificationLog>) -> CartStore {
    let mut cart = CartStore::open(Cache::memory(), log, Currency::EGP);
    cart.add_to_cart(&ethiopian(), Size::Medium, 2).unwrap();
    cart
}

pub fn form() -> ShippingForm {
    ShippingForm {
        full_name: "Mona Adel".into(),
        email: "mona@example.com".into(),
        phone: "01000000000".into(),
        address: "12 Tahrir St".into(),
        city: "Giza".into(),
        ..ShippingForm::default()
    }
}

pub fn messages(log: &NotificationLog) -> Vec<String> {
    log.entries().into_iter().map(|n| n.message).collect()
}
