//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartPricing, LineItem};
use crate::checkout::ShippingAddress;
use crate::email::EmailReport;
use crate::ids::{OrderId, OrderLineItemId, ProductId, PromocodeId, UserId};
use crate::money::{Currency, Money};

/// Order status.
///
/// Orders are created `Pending`; later transitions belong to fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order placed, awaiting processing.
    #[default]
    Pending,
    /// Order confirmed.
    Confirmed,
    /// Order being prepared.
    Processing,
    /// Order shipped.
    Shipped,
    /// Order delivered.
    Delivered,
    /// Order cancelled.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Check if the order is finished, one way or the other.
    pub fn is_final(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// How the customer pays. Only cash on delivery is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cod",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on delivery",
        }
    }
}

/// Generate an order number from a timestamp: `ORD-` and the last six
/// digits of the Unix time in milliseconds.
pub fn order_number_at(at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis().rem_euclid(1_000_000);
    format!("ORD-{:06}", millis)
}

/// Generate an order number for now.
pub fn generate_order_number() -> String {
    order_number_at(Utc::now())
}

/// Order header written at checkout.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewOrder {
    /// `None` for guest checkout.
    pub user_id: Option<UserId>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_fee: Decimal,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub promocode_id: Option<PromocodeId>,
}

impl NewOrder {
    pub fn new(
        user_id: Option<UserId>,
        pricing: &CartPricing,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        promocode_id: Option<PromocodeId>,
    ) -> Self {
        Self {
            user_id,
            subtotal: pricing.subtotal,
            discount_amount: pricing.discount,
            shipping_fee: pricing.shipping,
            total_price: pricing.grand_total,
            status: OrderStatus::Pending,
            shipping_address,
            payment_method,
            promocode_id,
        }
    }
}

/// Order line written at checkout, priced from the cart line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Decimal,
    pub size: String,
}

impl NewOrderItem {
    pub fn from_line(order_id: &OrderId, line: &LineItem) -> Self {
        Self {
            order_id: order_id.clone(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            price: line.unit_price,
            size: line.size.as_str().to_string(),
        }
    }
}

/// An `orders` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub shipping_fee: Decimal,
    pub total_price: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub promocode_id: Option<PromocodeId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An `order_items` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemRecord {
    pub id: OrderLineItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Decimal,
    #[serde(default)]
    pub size: Option<String>,
}

impl OrderItemRecord {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// What the customer sees after a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub order_number: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub grand_total: Decimal,
    pub currency: Currency,
    pub region_name: String,
    pub customer: ShippingAddress,
    pub item_count: usize,
    /// Code attached to the order, if any.
    pub promocode: Option<String>,
    /// Whether the promocode usage counter was advanced.
    pub promocode_recorded: bool,
    /// Outcome of each transactional email.
    #[serde(default)]
    pub emails: Vec<EmailReport>,
}

impl OrderConfirmation {
    pub fn grand_total_money(&self) -> Money {
        Money::new(self.grand_total, self.currency)
    }

    pub fn shipping_money(&self) -> Money {
        Money::new(self.shipping_fee, self.currency)
    }
}
