//! Promocode rules and evaluation.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartStore;
use crate::error::CommerceError;
use crate::ids::PromocodeId;
use crate::money::Money;
use crate::notify::{Notification, Notifier};
use crate::remote::RemoteStore;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// How a promocode discount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Percentage of the subtotal, optionally capped.
    Percentage,
    /// Fixed amount, never more than the subtotal.
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "percentage" | "percent" => Some(DiscountKind::Percentage),
            "fixed" | "fixed_amount" => Some(DiscountKind::Fixed),
            _ => None,
        }
    }
}

/// A validated promocode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promocode {
    pub id: PromocodeId,
    pub code: String,
    pub kind: DiscountKind,
    /// Percent (0-100) or fixed amount, depending on `kind`.
    pub value: Decimal,
    /// Cap on a percentage discount.
    pub max_discount: Option<Decimal>,
    /// Minimum subtotal for the code to apply.
    pub min_order: Decimal,
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    pub valid_until: Option<DateTime<Utc>>,
}

impl Promocode {
    /// Check if the code has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }

    /// Check if the usage limit is used up.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit.is_some_and(|limit| self.used_count >= limit)
    }

    /// The raw discount for a subtotal, without eligibility checks.
    ///
    /// Percentage: `subtotal * value / 100`, capped at `max_discount`.
    /// Fixed: `min(subtotal, value)`. Never negative, never above the subtotal.
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let discount = match self.kind {
            DiscountKind::Percentage => {
                let raw = subtotal * self.value / HUNDRED;
                match self.max_discount {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            DiscountKind::Fixed => self.value.min(subtotal),
        };
        discount.max(Decimal::ZERO).min(subtotal)
    }

    /// Run the apply-time rules in order: expiry, usage limit, minimum order.
    pub fn check(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<(), PromocodeRejection> {
        if self.is_expired_at(now) {
            return Err(PromocodeRejection::Expired);
        }
        if self.is_exhausted() {
            return Err(PromocodeRejection::UsageLimitReached);
        }
        if subtotal < self.min_order {
            return Err(PromocodeRejection::BelowMinimum {
                minimum: self.min_order,
            });
        }
        Ok(())
    }

    /// Check that the code still qualifies for the live cart.
    ///
    /// The minimum order and expiry are re-checked on every call, so a cart
    /// that shrinks below the minimum after the code was applied loses the
    /// discount until it grows back.
    pub fn is_eligible(&self, subtotal: Decimal, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && subtotal >= self.min_order
    }

    /// Discount for the live cart: zero when the code no longer qualifies.
    pub fn eligible_discount(&self, subtotal: Decimal, now: DateTime<Utc>) -> Decimal {
        if self.is_eligible(subtotal, now) {
            self.discount_for(subtotal)
        } else {
            Decimal::ZERO
        }
    }
}

/// A `promocodes` row as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromocodeRecord {
    pub id: PromocodeId,
    pub code: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    #[serde(default)]
    pub max_discount_amount: Option<Decimal>,
    #[serde(default)]
    pub min_order_amount: Option<Decimal>,
    #[serde(default)]
    pub usage_limit: Option<i64>,
    #[serde(default)]
    pub used_count: Option<i64>,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TryFrom<PromocodeRecord> for Promocode {
    type Error = CommerceError;

    fn try_from(record: PromocodeRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: String| CommerceError::InvalidRecord {
            table: "promocodes",
            reason,
        };

        let kind = DiscountKind::from_str(&record.discount_type).ok_or_else(|| {
            invalid(format!(
                "promocode {} has unknown discount type {:?}",
                record.code, record.discount_type
            ))
        })?;
        if record.discount_value.is_sign_negative() && !record.discount_value.is_zero() {
            return Err(invalid(format!("promocode {} has a negative value", record.code)));
        }
        if kind == DiscountKind::Percentage && record.discount_value > HUNDRED {
            return Err(invalid(format!("promocode {} exceeds 100 percent", record.code)));
        }
        let valid_until = match record.valid_until.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(parse_expiry(raw).ok_or_else(|| {
                invalid(format!("promocode {} has unreadable expiry {:?}", record.code, raw))
            })?),
        };

        Ok(Promocode {
            id: record.id,
            code: record.code,
            kind,
            value: record.discount_value,
            max_discount: record.max_discount_amount,
            min_order: record.min_order_amount.unwrap_or(Decimal::ZERO),
            usage_limit: record.usage_limit,
            used_count: record.used_count.unwrap_or(0),
            valid_until,
        })
    }
}

/// Timestamps are RFC 3339; a bare date means the end of that day (UTC).
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(23, 59, 59)?.and_utc())
}

/// Why a promocode was turned down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromocodeRejection {
    /// No active code with that text.
    NotFound,
    /// Past its `valid_until`.
    Expired,
    /// `used_count` reached `usage_limit`.
    UsageLimitReached,
    /// The cart subtotal is under the code's minimum.
    BelowMinimum { minimum: Decimal },
}

impl PromocodeRejection {
    /// Message shown to the user.
    pub fn message(&self, currency: crate::money::Currency) -> String {
        match self {
            PromocodeRejection::NotFound => "Invalid promocode.".to_string(),
            PromocodeRejection::Expired => "This promocode has expired.".to_string(),
            PromocodeRejection::UsageLimitReached => {
                "This promocode has reached its usage limit.".to_string()
            }
            PromocodeRejection::BelowMinimum { minimum } => format!(
                "Minimum order amount of {} required for this promocode.",
                Money::new(*minimum, currency).display()
            ),
        }
    }
}

/// Result of applying a code: accepted or turned down by a business rule.
#[derive(Debug, Clone, PartialEq)]
pub enum PromocodeOutcome {
    Applied(Promocode),
    Rejected(PromocodeRejection),
}

impl PromocodeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PromocodeOutcome::Applied(_))
    }
}

/// Validates codes against the backend and stores accepted ones in the cart.
pub struct PromocodeEvaluator {
    remote: RemoteStore,
    notifier: Arc<dyn Notifier>,
}

impl PromocodeEvaluator {
    pub fn new(remote: RemoteStore, notifier: Arc<dyn Notifier>) -> Self {
        Self { remote, notifier }
    }

    /// Apply a code to the cart.
    ///
    /// Rule rejections come back as `Ok(Rejected)` and leave the cart as it
    /// was. A lookup failure or timeout is an `Err`, also without touching
    /// the cart. A notification is emitted in every case.
    pub async fn apply(&self, cart: &mut CartStore, code: &str) -> Result<PromocodeOutcome, CommerceError> {
        let outcome = match self.evaluate(cart, code).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(code, error = %e, "promocode lookup failed");
                self.notifier
                    .notify(Notification::error("Error applying promocode. Please try again."));
                return Err(e);
            }
        };

        match outcome {
            PromocodeOutcome::Applied(ref promocode) => {
                if let Err(e) = cart.set_promocode(promocode.clone()) {
                    tracing::warn!(code = %promocode.code, error = %e, "failed to store promocode");
                    self.notifier
                        .notify(Notification::error("Error applying promocode. Please try again."));
                    return Err(e);
                }
                tracing::info!(code = %promocode.code, "promocode applied");
                self.notifier
                    .notify(Notification::success("Promocode applied successfully!"));
            }
            PromocodeOutcome::Rejected(ref rejection) => {
                tracing::info!(code, reason = ?rejection, "promocode rejected");
                self.notifier
                    .notify(Notification::error(rejection.message(cart.currency())));
            }
        }

        Ok(outcome)
    }

    /// Run the rules without storing anything.
    pub async fn evaluate(&self, cart: &CartStore, code: &str) -> Result<PromocodeOutcome, CommerceError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(PromocodeOutcome::Rejected(PromocodeRejection::NotFound));
        }

        let Some(promocode) = self.remote.active_promocode(code).await? else {
            return Ok(PromocodeOutcome::Rejected(PromocodeRejection::NotFound));
        };

        Ok(match promocode.check(cart.subtotal(), Utc::now()) {
            Ok(()) => PromocodeOutcome::Applied(promocode),
            Err(rejection) => PromocodeOutcome::Rejected(rejection),
        })
    }
}
