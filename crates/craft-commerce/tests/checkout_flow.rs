//! End-to-end checkout against an in-memory backend with injected faults.

mod common;

use std::sync::Arc;

use craft_commerce::prelude::*;
use craft_commerce::remote::tables;
use craft_db::{Fault, Operation};
use rust_decimal::Decimal;

use common::*;

#[tokio::test(start_paused = true)]
async fn test_unselected_region_writes_nothing() {
    let store = faulty();
    let log = Arc::new(NotificationLog::new());
    let mut cart = cart_with_ethiopian(log.clone());
    let mut checkout = Checkout::new(remote_over(store.clone()), log.clone());

    let error = checkout.validate(&form()).unwrap_err();
    assert!(error.field_errors().unwrap().contains(Field::Region));

    let result = checkout.submit(&mut cart, None).await;
    assert!(matches!(result, Err(CommerceError::RegionNotSelected)));

    assert!(store.calls().is_empty());
    assert_eq!(cart.item_count(), 2);
    assert_eq!(
        log.last().map(|n| n.message),
        Some("Please select a shipping region".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_successful_order_with_promocode() {
    let store = faulty();
    let remote = remote_over(store.clone());
    let log = Arc::new(NotificationLog::new());
    let mut cart = cart_with_ethiopian(log.clone());

    let outcome = PromocodeEvaluator::new(remote.clone(), log.clone())
        .apply(&mut cart, "SAVE10")
        .await
        .unwrap();
    assert!(outcome.is_applied());
    assert_eq!(cart.discount_amount(), Decimal::new(4998, 3));
    assert_eq!(cart.cart_total(), Decimal::new(44982, 3));

    let mut checkout = Checkout::new(remote, log.clone());
    checkout.load_regions().await.unwrap();
    checkout.select_region(&RegionId::new("giza")).unwrap();
    checkout.validate(&form()).unwrap();
    let confirmation = checkout.submit(&mut cart, None).await.unwrap();

    assert_eq!(checkout.state(), CheckoutState::Succeeded);
    assert_eq!(confirmation.subtotal, Decimal::new(4998, 2));
    assert_eq!(confirmation.shipping_fee, Decimal::from(60));
    assert_eq!(
        confirmation.grand_total,
        confirmation.subtotal - confirmation.discount + confirmation.shipping_fee
    );
    assert_eq!(confirmation.grand_total, Decimal::new(104982, 3));
    assert!(confirmation.order_number.starts_with("ORD-"));
    assert_eq!(confirmation.promocode.as_deref(), Some("SAVE10"));
    assert!(confirmation.promocode_recorded);

    let memory = store.inner();
    assert_eq!(memory.count(tables::ORDERS), 1);
    let items = memory.rows(tables::ORDER_ITEMS);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get_str("order_id"), Some(confirmation.order_id.as_str()));
    assert_eq!(items[0].get_str("size"), Some("Medium"));

    let save10 = memory
        .rows(tables::PROMOCODES)
        .into_iter()
        .find(|r| r.get_str("code") == Some("SAVE10"))
        .unwrap();
    assert_eq!(save10.get("used_count"), Some(&serde_json::json!(1)));

    assert!(cart.is_empty());
    assert!(cart.promocode().is_none());
    assert_eq!(
        log.last().map(|n| n.message),
        Some("Order placed successfully!".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_hung_item_insert_rolls_back() {
    let store = faulty();
    store.inject(tables::ORDER_ITEMS, Operation::Insert, Fault::Hang);
    let log = Arc::new(NotificationLog::new());
    let mut cart = cart_with_ethiopian(log.clone());

    let mut checkout = Checkout::new(remote_over(store.clone()), log.clone());
    checkout.load_regions().await.unwrap();
    checkout.select_region(&RegionId::new("cairo")).unwrap();
    checkout.validate(&form()).unwrap();

    let error = checkout.submit(&mut cart, None).await.unwrap_err();
    assert!(matches!(error, CommerceError::Timeout(_)));
    assert!(error.is_retryable());

    assert_eq!(checkout.state(), CheckoutState::Failed);
    assert_eq!(cart.item_count(), 2);
    assert_eq!(store.inner().count(tables::ORDERS), 0);
    assert_eq!(store.inner().count(tables::ORDER_ITEMS), 0);
    assert_eq!(
        log.last().map(|n| n.message),
        Some("Error processing order. Please try again.".to_string())
    );

    // Retrying after the backend recovers places exactly one order.
    store.heal(tables::ORDER_ITEMS, Operation::Insert);
    checkout.submit(&mut cart, None).await.unwrap();
    assert_eq!(store.inner().count(tables::ORDERS), 1);
    assert_eq!(store.inner().count(tables::ORDER_ITEMS), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_header_insert_leaves_cart() {
    let store = faulty();
    store.inject(tables::ORDERS, Operation::Insert, Fault::Hang);
    let log = Arc::new(NotificationLog::new());
    let mut cart = cart_with_ethiopian(log.clone());

    let mut checkout = Checkout::new(remote_over(store.clone()), log);
    checkout.load_regions().await.unwrap();
    checkout.select_region(&RegionId::new("giza")).unwrap();
    checkout.validate(&form()).unwrap();

    assert!(checkout.submit(&mut cart, None).await.is_err());
    assert_eq!(store.call_count(tables::ORDER_ITEMS, Operation::Insert), 0);
    assert_eq!(store.inner().count(tables::ORDERS), 0);
    assert!(!cart.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_region_load_failure_notifies() {
    let store = faulty();
    store.inject(tables::SHIPPING_REGIONS, Operation::Select, Fault::Hang);
    let log = Arc::new(NotificationLog::new());

    let mut checkout = Checkout::new(remote_over(store), log.clone());
    assert!(checkout.load_regions().await.is_err());
    assert!(checkout.regions().is_empty());
    assert_eq!(
        messages(&log),
        vec!["Could not load shipping regions. Please try again.".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_cart_rejected() {
    let store = faulty();
    let log = Arc::new(NotificationLog::new());
    let mut cart = cart_with_ethiopian(log.clone());
    cart.clear_cart().unwrap();

    let mut checkout = Checkout::new(remote_over(store.clone()), log);
    checkout.load_regions().await.unwrap();
    checkout.select_region(&RegionId::new("giza")).unwrap();
    checkout.validate(&form()).unwrap();

    assert!(matches!(
        checkout.submit(&mut cart, None).await,
        Err(CommerceError::EmptyCart)
    ));
    assert_eq!(store.call_count(tables::ORDERS, Operation::Insert), 0);
}

#[tokio::test(start_paused = true)]
async fn test_signed_in_history() {
    let store = faulty();
    let remote = remote_over(store);
    let log = Arc::new(NotificationLog::new());
    let user = UserId::new("user-1");

    for _ in 0..2 {
        let mut cart = cart_with_ethiopian(log.clone());
        let mut checkout = Checkout::new(remote.clone(), log.clone());
        checkout.load_regions().await.unwrap();
        checkout.select_region(&RegionId::new("giza")).unwrap();
        checkout.validate(&form()).unwrap();
        checkout.submit(&mut cart, Some(&user)).await.unwrap();
    }

    let history = OrderHistory::new(remote).fetch(&user).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|s| s.item_count() == 2));
    assert_eq!(history[0].order.status, OrderStatus::Pending);
    assert_eq!(history[0].items_total(), Decimal::new(4998, 2));
}
