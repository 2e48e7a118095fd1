//! Transactional order emails.
//!
//! After an order is placed the checkout asks an [`EmailDispatcher`] for the
//! customer confirmation and the owner notification. Delivery is best
//! effort: a failed send is reported on the confirmation and the order
//! stands.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use craft_data::{EmailError, EmailFunctionClient, EmailKind, EmailReceipt, EmailServiceStatus};
use serde::{Deserialize, Serialize};

use crate::checkout::ShippingAddress;
use crate::money::Money;

/// One line of the order as shown in the email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderEmailItem {
    pub name: String,
    pub size: String,
    pub quantity: i64,
    pub price: String,
}

/// The `orderData` payload sent to the email function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderEmail {
    pub order_number: String,
    pub customer_info: ShippingAddress,
    pub items: Vec<OrderEmailItem>,
    pub subtotal: String,
    pub discount_amount: String,
    pub shipping_fee: String,
    pub order_total: String,
    pub region_name: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
}

impl OrderEmail {
    /// Two-decimal amount as the email templates expect.
    pub fn amount(money: Money) -> String {
        money.display_amount()
    }
}

/// Result of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent(EmailReceipt),
    /// This message was already sent for the order.
    AlreadySent,
}

/// Sends order emails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// Send one message for an order.
    async fn send(&self, email: &OrderEmail, kind: EmailKind) -> Result<Delivery, EmailError>;

    /// Health of the email service.
    async fn status(&self) -> Result<EmailServiceStatus, EmailError>;
}

/// What happened to one email of an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailReport {
    pub kind: EmailKind,
    pub sent: bool,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl EmailReport {
    pub fn sent(kind: EmailKind, receipt: Option<&EmailReceipt>) -> Self {
        Self {
            kind,
            sent: true,
            message_id: receipt.and_then(|r| r.message_id.clone()),
            error: None,
        }
    }

    pub fn failed(kind: EmailKind, error: impl ToString) -> Self {
        Self {
            kind,
            sent: false,
            message_id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Dispatcher backed by the email edge function.
///
/// Each (order number, kind) pair is sent at most once per dispatcher; a
/// failed send releases the pair so a later attempt can retry it.
#[derive(Debug)]
pub struct EdgeFunctionMailer {
    client: EmailFunctionClient,
    sent: Mutex<HashSet<(String, EmailKind)>>,
}

impl EdgeFunctionMailer {
    pub fn new(client: EmailFunctionClient) -> Self {
        Self {
            client,
            sent: Mutex::new(HashSet::new()),
        }
    }

    pub fn client(&self) -> &EmailFunctionClient {
        &self.client
    }

    fn claim(&self, order_number: &str, kind: EmailKind) -> bool {
        self.sent
            .lock()
            .map(|mut sent| sent.insert((order_number.to_string(), kind)))
            .unwrap_or(true)
    }

    fn release(&self, order_number: &str, kind: EmailKind) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.remove(&(order_number.to_string(), kind));
        }
    }
}

#[async_trait]
impl EmailDispatcher for EdgeFunctionMailer {
    async fn send(&self, email: &OrderEmail, kind: EmailKind) -> Result<Delivery, EmailError> {
        if !self.claim(&email.order_number, kind) {
            tracing::debug!(order_number = %email.order_number, kind = %kind, "email already sent");
            return Ok(Delivery::AlreadySent);
        }

        match self.client.send(email, kind).await {
            Ok(receipt) => Ok(Delivery::Sent(receipt)),
            Err(e) => {
                self.release(&email.order_number, kind);
                Err(e)
            }
        }
    }

    async fn status(&self) -> Result<EmailServiceStatus, EmailError> {
        Ok(self.client.status().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_data::FetchClient;

    fn email(number: &str) -> OrderEmail {
        OrderEmail {
            order_number: number.to_string(),
            customer_info: ShippingAddress::default(),
            items: vec![],
            subtotal: "49.98".into(),
            discount_amount: "0.00".into(),
            shipping_fee: "60.00".into(),
            order_total: "109.98".into(),
            region_name: "Giza".into(),
            payment_method: "cod".into(),
            owner_email: None,
        }
    }

    #[test]
    fn test_payload_shape() {
        let value = serde_json::to_value(email("ORD-000001")).unwrap();
        assert_eq!(value["orderNumber"], "ORD-000001");
        assert_eq!(value["orderTotal"], "109.98");
        assert!(value.get("ownerEmail").is_none());
        assert!(value["customerInfo"].get("fullName").is_some());
    }

    #[test]
    fn test_claim_once_per_kind() {
        let mailer = EdgeFunctionMailer::new(EmailFunctionClient::new(
            FetchClient::new("http://localhost:54321"),
            craft_data::DEFAULT_EMAIL_FUNCTION_PATH,
        ));

        assert!(mailer.claim("ORD-1", EmailKind::Customer));
        assert!(!mailer.claim("ORD-1", EmailKind::Customer));
        assert!(mailer.claim("ORD-1", EmailKind::Owner));

        mailer.release("ORD-1", EmailKind::Customer);
        assert!(mailer.claim("ORD-1", EmailKind::Customer));
    }

    #[tokio::test]
    async fn test_mock_dispatcher() {
        let mut mock = MockEmailDispatcher::new();
        mock.expect_send()
            .withf(|email, kind| email.order_number == "ORD-2" && *kind == EmailKind::Owner)
            .times(1)
            .returning(|_, _| Ok(Delivery::AlreadySent));

        let delivery = mock.send(&email("ORD-2"), EmailKind::Owner).await.unwrap();
        assert_eq!(delivery, Delivery::AlreadySent);
    }
}
