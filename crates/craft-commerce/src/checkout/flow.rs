//! Checkout state machine and order placement.

use std::sync::Arc;

use chrono::Utc;
use craft_data::{EmailKind, RemoteStep};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartPricing, CartStore, LineItem, Promocode};
use crate::checkout::{
    generate_order_number, Field, NewOrder, NewOrderItem, OrderConfirmation, ShippingForm,
    ShippingRegion,
};
use crate::email::{Delivery, EmailDispatcher, EmailReport, OrderEmail, OrderEmailItem};
use crate::error::CommerceError;
use crate::ids::{OrderId, RegionId, UserId};
use crate::notify::{Notification, Notifier};
use crate::remote::RemoteStore;

/// Where a checkout session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Nothing chosen yet.
    #[default]
    Idle,
    /// A shipping region is selected.
    RegionSelected,
    /// Region selected and the form passed validation.
    Validated,
    /// The order is being written.
    Submitting,
    /// The order was placed.
    Succeeded,
    /// Placing the order failed; the cart is untouched.
    Failed,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::RegionSelected => "region_selected",
            CheckoutState::Validated => "validated",
            CheckoutState::Submitting => "submitting",
            CheckoutState::Succeeded => "succeeded",
            CheckoutState::Failed => "failed",
        }
    }

    /// Check if the state machine allows moving to `next`.
    pub fn can_transition_to(&self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (_, Idle)
                | (Idle | RegionSelected | Validated | Failed, RegionSelected)
                | (RegionSelected | Validated | Failed, Validated)
                | (Validated | Failed, Submitting)
                | (Submitting, Succeeded | Failed)
        )
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One checkout session.
///
/// Regions are loaded, one is selected, the form is validated, then
/// [`Checkout::submit`] writes the order header and lines. Every remote
/// step is time-bounded; a step that fails or times out fails the
/// submission, removes anything already written for it, and leaves the
/// cart as it was.
pub struct Checkout {
    remote: RemoteStore,
    notifier: Arc<dyn Notifier>,
    mailer: Option<Arc<dyn EmailDispatcher>>,
    owner_email: Option<String>,
    regions: Vec<ShippingRegion>,
    region: Option<ShippingRegion>,
    form: Option<ShippingForm>,
    state: CheckoutState,
}

impl Checkout {
    pub fn new(remote: RemoteStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            remote,
            notifier,
            mailer: None,
            owner_email: None,
            regions: Vec::new(),
            region: None,
            form: None,
            state: CheckoutState::Idle,
        }
    }

    /// Send order emails through `mailer` after a successful order.
    pub fn with_mailer(mut self, mailer: Arc<dyn EmailDispatcher>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Address passed to the owner notification.
    pub fn with_owner_email(mut self, owner_email: impl Into<String>) -> Self {
        self.owner_email = Some(owner_email.into());
        self
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn regions(&self) -> &[ShippingRegion] {
        &self.regions
    }

    pub fn selected_region(&self) -> Option<&ShippingRegion> {
        self.region.as_ref()
    }

    /// Fee of the selected region; `None` until one is chosen.
    pub fn shipping_fee(&self) -> Option<Decimal> {
        self.region.as_ref().map(|r| r.shipping_fee)
    }

    fn transition(&mut self, next: CheckoutState) -> Result<(), CommerceError> {
        if !self.state.can_transition_to(next) {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(from = %self.state, to = %next, "checkout transition");
        self.state = next;
        Ok(())
    }

    /// Fetch the active shipping regions.
    pub async fn load_regions(&mut self) -> Result<&[ShippingRegion], CommerceError> {
        match self.remote.active_regions().await {
            Ok(regions) => {
                tracing::debug!(count = regions.len(), "shipping regions loaded");
                self.regions = regions;
                Ok(&self.regions)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load shipping regions");
                self.notifier
                    .notify(Notification::error("Could not load shipping regions. Please try again."));
                Err(e)
            }
        }
    }

    /// Select one of the loaded regions.
    pub fn select_region(&mut self, id: &RegionId) -> Result<&ShippingRegion, CommerceError> {
        let region = self
            .regions
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| CommerceError::RegionNotFound(id.to_string()))?;

        self.transition(CheckoutState::RegionSelected)?;
        self.form = None;
        Ok(&*self.region.insert(region))
    }

    /// Drop the region selection.
    pub fn clear_region(&mut self) {
        self.region = None;
        self.form = None;
        self.state = CheckoutState::Idle;
    }

    /// Start over, keeping the loaded regions.
    pub fn reset(&mut self) {
        self.clear_region();
    }

    /// Validate the form against the current selection.
    ///
    /// Collects every violation, including a missing region. No network
    /// call is made.
    pub fn validate(&mut self, form: &ShippingForm) -> Result<(), CommerceError> {
        if matches!(self.state, CheckoutState::Submitting | CheckoutState::Succeeded) {
            return Err(CommerceError::InvalidCheckoutTransition {
                from: self.state.to_string(),
                to: CheckoutState::Validated.to_string(),
            });
        }

        let mut errors = form.check();
        if self.region.is_none() {
            errors.insert(Field::Region, "Please select a shipping region");
        }

        if !errors.is_empty() {
            self.form = None;
            self.state = if self.region.is_some() {
                CheckoutState::RegionSelected
            } else {
                CheckoutState::Idle
            };
            tracing::debug!(fields = errors.len(), "checkout form invalid");
            self.notifier
                .notify(Notification::error("Please fill in all required fields"));
            return Err(CommerceError::Validation(errors));
        }

        self.transition(CheckoutState::Validated)?;
        self.form = Some(form.clone());
        Ok(())
    }

    /// Totals for the cart with the selected region's fee.
    pub fn pricing(&self, cart: &CartStore) -> CartPricing {
        cart.pricing().with_shipping(self.shipping_fee().unwrap_or(Decimal::ZERO))
    }

    /// Place the order.
    ///
    /// Without a selected region this fails with
    /// [`CommerceError::RegionNotSelected`] before anything is written.
    pub async fn submit(
        &mut self,
        cart: &mut CartStore,
        user_id: Option<&UserId>,
    ) -> Result<OrderConfirmation, CommerceError> {
        let Some(region) = self.region.clone() else {
            self.notifier
                .notify(Notification::error("Please select a shipping region"));
            return Err(CommerceError::RegionNotSelected);
        };
        let form = match (&self.form, self.state) {
            (Some(form), CheckoutState::Validated | CheckoutState::Failed) => form.clone(),
            _ => {
                return Err(CommerceError::InvalidCheckoutTransition {
                    from: self.state.to_string(),
                    to: CheckoutState::Submitting.to_string(),
                })
            }
        };
        if cart.is_empty() {
            self.notifier.notify(Notification::error("Your cart is empty"));
            return Err(CommerceError::EmptyCart);
        }

        self.transition(CheckoutState::Submitting)?;

        match self.place(cart, &region, &form, user_id).await {
            Ok(confirmation) => {
                self.transition(CheckoutState::Succeeded)?;
                tracing::info!(
                    order_id = %confirmation.order_id,
                    order_number = %confirmation.order_number,
                    total = %confirmation.grand_total,
                    "order placed"
                );
                self.notifier
                    .notify(Notification::success("Order placed successfully!"));
                Ok(confirmation)
            }
            Err(e) => {
                self.transition(CheckoutState::Failed)?;
                tracing::warn!(error = %e, "order failed");
                self.notifier
                    .notify(Notification::error("Error processing order. Please try again."));
                Err(e)
            }
        }
    }

    async fn place(
        &self,
        cart: &mut CartStore,
        region: &ShippingRegion,
        form: &ShippingForm,
        user_id: Option<&UserId>,
    ) -> Result<OrderConfirmation, CommerceError> {
        let now = Utc::now();
        let lines: Vec<LineItem> = cart.lines().to_vec();
        let promocode = cart.cart().eligible_promocode_at(now).cloned();
        let subtotal = cart.subtotal();
        let discount = promocode
            .as_ref()
            .map(|p| p.discount_for(subtotal))
            .unwrap_or(Decimal::ZERO);
        let pricing = CartPricing::compute(subtotal, discount, region.shipping_fee, cart.currency());

        let address = form.to_address();
        let new_order = NewOrder::new(
            user_id.cloned(),
            &pricing,
            address.clone(),
            form.payment_method,
            promocode.as_ref().map(|p| p.id.clone()),
        );

        let order = self.remote.insert_order(&new_order).await?;

        let items: Vec<NewOrderItem> = lines
            .iter()
            .map(|line| NewOrderItem::from_line(&order.id, line))
            .collect();
        if let Err(e) = self.remote.insert_order_items(&items).await {
            self.compensate(&order.id).await;
            return Err(e);
        }

        let promocode_recorded = match promocode.as_ref() {
            Some(promocode) => self.record_promocode_use(promocode).await,
            None => false,
        };

        if let Err(e) = cart.clear_cart() {
            tracing::error!(order_id = %order.id, error = %e, "order placed but the cart could not be cleared");
        }

        let mut confirmation = OrderConfirmation {
            order_id: order.id,
            order_number: generate_order_number(),
            subtotal: pricing.subtotal,
            discount: pricing.discount,
            shipping_fee: pricing.shipping,
            grand_total: pricing.grand_total,
            currency: pricing.currency,
            region_name: region.name.clone(),
            customer: address,
            item_count: items.len(),
            promocode: promocode.map(|p| p.code),
            promocode_recorded,
            emails: Vec::new(),
        };
        confirmation.emails = self.send_emails(&confirmation, &lines, form).await;

        Ok(confirmation)
    }

    /// Remove a header whose lines could not be written.
    async fn compensate(&self, order_id: &OrderId) {
        match self.remote.delete_order(order_id).await {
            Ok(()) => tracing::info!(order_id = %order_id, "partial order removed"),
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "could not remove partial order")
            }
        }
    }

    /// Advance the promocode usage counter once.
    ///
    /// The code is re-read first; the write only applies if `used_count` is
    /// still what was read, so concurrent checkouts cannot overshoot the
    /// limit. Failures are logged and never fail the order.
    async fn record_promocode_use(&self, promocode: &Promocode) -> bool {
        let fresh = match self.remote.promocode(&promocode.id).await {
            Ok(Some((fresh, true))) => fresh,
            Ok(Some((_, false))) | Ok(None) => {
                tracing::warn!(code = %promocode.code, "promocode no longer active, usage not recorded");
                return false;
            }
            Err(e) => {
                tracing::warn!(code = %promocode.code, error = %e, "promocode re-check failed");
                return false;
            }
        };

        if fresh.is_exhausted() {
            tracing::warn!(
                code = %fresh.code,
                used = fresh.used_count,
                limit = fresh.usage_limit,
                "promocode usage limit reached, usage not recorded"
            );
            return false;
        }

        match self.remote.increment_promocode_usage(&fresh).await {
            Ok(true) => {
                tracing::debug!(code = %fresh.code, used = fresh.used_count + 1, "promocode usage recorded");
                true
            }
            Ok(false) => {
                tracing::warn!(code = %fresh.code, "promocode usage changed concurrently, not recorded");
                false
            }
            Err(e) => {
                tracing::warn!(code = %fresh.code, error = %e, "failed to record promocode usage");
                false
            }
        }
    }

    async fn send_emails(
        &self,
        confirmation: &OrderConfirmation,
        lines: &[LineItem],
        form: &ShippingForm,
    ) -> Vec<EmailReport> {
        let Some(mailer) = self.mailer.as_ref() else {
            return Vec::new();
        };

        let money = |amount| OrderEmail::amount(crate::money::Money::new(amount, confirmation.currency));
        let email = OrderEmail {
            order_number: confirmation.order_number.clone(),
            customer_info: confirmation.customer.clone(),
            items: lines
                .iter()
                .map(|line| OrderEmailItem {
                    name: line.product.name.clone(),
                    size: line.size.as_str().to_string(),
                    quantity: line.quantity,
                    price: money(line.unit_price),
                })
                .collect(),
            subtotal: money(confirmation.subtotal),
            discount_amount: money(confirmation.discount),
            shipping_fee: money(confirmation.shipping_fee),
            order_total: money(confirmation.grand_total),
            region_name: confirmation.region_name.clone(),
            payment_method: form.payment_method.as_str().to_string(),
            owner_email: self.owner_email.clone(),
        };

        let mut reports = Vec::with_capacity(2);
        for kind in [EmailKind::Customer, EmailKind::Owner] {
            let result = self
                .remote
                .timeouts()
                .run(RemoteStep::Email, mailer.send(&email, kind))
                .await;
            reports.push(match result {
                Ok(Delivery::Sent(receipt)) => EmailReport::sent(kind, Some(&receipt)),
                Ok(Delivery::AlreadySent) => EmailReport::sent(kind, None),
                Err(e) => {
                    tracing::warn!(order_number = %email.order_number, kind = %kind, error = %e, "order email failed");
                    EmailReport::failed(kind, e)
                }
            });
        }
        reports
    }
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout")
            .field("state", &self.state)
            .field("region", &self.region)
            .field("regions", &self.regions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Product, Size};
    use crate::email::MockEmailDispatcher;
    use crate::money::Currency;
    use crate::notify::NotificationLog;
    use crate::remote::tables;
    use craft_cache::Cache;
    use craft_data::{EmailError, TimeoutConfig};
    use craft_db::{Db, MemoryStore};
    use serde_json::json;

    fn remote() -> (RemoteStore, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new().with_rows(
            tables::SHIPPING_REGIONS,
            [json!({"id": "giza", "name": "Giza", "shipping_fee": 60, "is_active": true})],
        ));
        (RemoteStore::new(Db::new(memory.clone()), TimeoutConfig::default()), memory)
    }

    fn form() -> ShippingForm {
        ShippingForm {
            full_name: "Mona Adel".into(),
            email: "mona@example.com".into(),
            phone: "01000000000".into(),
            address: "12 Tahrir St".into(),
            city: "Giza".into(),
            ..ShippingForm::default()
        }
    }

    fn cart(log: Arc<NotificationLog>) -> CartStore {
        let mut cart = CartStore::open(Cache::memory(), log, Currency::EGP);
        let product = Product::new("eth", "Ethiopian", Decimal::new(2499, 2));
        cart.add_to_cart(&product, Size::Medium, 2).unwrap();
        cart
    }

    #[test]
    fn test_transitions() {
        use CheckoutState::*;
        assert!(Idle.can_transition_to(RegionSelected));
        assert!(!Idle.can_transition_to(Validated));
        assert!(!Idle.can_transition_to(Submitting));
        assert!(!RegionSelected.can_transition_to(Submitting));
        assert!(Validated.can_transition_to(Submitting));
        assert!(Failed.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Failed));
        assert!(!Succeeded.can_transition_to(Submitting));
    }

    #[tokio::test]
    async fn test_validate_without_region_reports_region() {
        let (remote, _) = remote();
        let mut checkout = Checkout::new(remote, Arc::new(NotificationLog::new()));

        let error = checkout.validate(&form()).unwrap_err();
        let fields = error.field_errors().unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains(Field::Region));
        assert_eq!(checkout.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_select_unknown_region() {
        let (remote, _) = remote();
        let mut checkout = Checkout::new(remote, Arc::new(NotificationLog::new()));
        checkout.load_regions().await.unwrap();

        assert!(matches!(
            checkout.select_region(&RegionId::new("luxor")),
            Err(CommerceError::RegionNotFound(_))
        ));
        assert_eq!(checkout.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_submit_before_validation_rejected() {
        let (remote, memory) = remote();
        let log = Arc::new(NotificationLog::new());
        let mut cart = cart(log.clone());
        let mut checkout = Checkout::new(remote, log);
        checkout.load_regions().await.unwrap();
        checkout.select_region(&RegionId::new("giza")).unwrap();

        assert!(matches!(
            checkout.submit(&mut cart, None).await,
            Err(CommerceError::InvalidCheckoutTransition { .. })
        ));
        assert_eq!(memory.count(tables::ORDERS), 0);
    }

    #[tokio::test]
    async fn test_email_failure_keeps_order() {
        let (remote, memory) = remote();
        let log = Arc::new(NotificationLog::new());
        let mut cart = cart(log.clone());

        let mut mailer = MockEmailDispatcher::new();
        mailer
            .expect_send()
            .withf(|_, kind| *kind == EmailKind::Customer)
            .times(1)
            .returning(|_, _| Err(EmailError::Rejected("Customer email is required".into())));
        mailer
            .expect_send()
            .withf(|email, kind| *kind == EmailKind::Owner && email.order_total == "109.98")
            .times(1)
            .returning(|_, _| Ok(Delivery::AlreadySent));

        let mut checkout = Checkout::new(remote, log.clone()).with_mailer(Arc::new(mailer));
        checkout.load_regions().await.unwrap();
        checkout.select_region(&RegionId::new("giza")).unwrap();
        checkout.validate(&form()).unwrap();

        let confirmation = checkout.submit(&mut cart, None).await.unwrap();

        assert_eq!(checkout.state(), CheckoutState::Succeeded);
        assert_eq!(memory.count(tables::ORDERS), 1);
        assert!(cart.is_empty());
        assert_eq!(confirmation.emails.len(), 2);
        assert!(!confirmation.emails[0].sent);
        assert!(confirmation.emails[1].sent);
        assert_eq!(
            log.last().map(|n| n.message),
            Some("Order placed successfully!".to_string())
        );
    }
}
