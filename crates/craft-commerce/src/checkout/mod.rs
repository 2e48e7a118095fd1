//! Checkout module.
//!
//! Contains the shipping form and address snapshot, shipping regions,
//! orders, the checkout flow, and order history.

mod address;
mod flow;
mod history;
mod order;
mod shipping;

pub use address::{is_valid_email, Field, FieldErrors, ShippingAddress, ShippingForm};
pub use flow::{Checkout, CheckoutState};
pub use history::{OrderHistory, OrderSummary};
pub use order::{
    generate_order_number, order_number_at, NewOrder, NewOrderItem, OrderConfirmation, OrderItemRecord,
    OrderRecord, OrderStatus, PaymentMethod,
};
pub use shipping::ShippingRegion;
