//! Money type for representing monetary values.
//!
//! Amounts are exact decimals, so a 10% discount on 49.98 is 4.998 and not
//! a float approximation. Rounding happens only for display.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    EGP,
    USD,
    EUR,
    GBP,
    SAR,
    AED,
}

impl Currency {
    /// Get the currency code (e.g., "EGP").
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EGP => "EGP",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::SAR => "SAR",
            Currency::AED => "AED",
        }
    }

    /// Get the display prefix (e.g., "EGP", "$").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::EGP => "EGP",
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::SAR => "SAR",
            Currency::AED => "AED",
        }
    }

    /// Get the number of decimal places shown for this currency.
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Parse a currency code string.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "EGP" => Some(Currency::EGP),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "SAR" => Some(Currency::SAR),
            "AED" => Some(Currency::AED),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Exact amount in major units.
    pub amount: Decimal,
    /// The currency.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Check if this is negative.
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// The amount rounded half away from zero to the currency's places.
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(self.currency.decimal_places(), RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format as a display string (e.g., "EGP44.98").
    pub fn display(&self) -> String {
        format!("{}{}", self.currency.symbol(), self.display_amount())
    }

    /// Format as a display string without symbol (e.g., "44.98").
    pub fn display_amount(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        format!("{:.places$}", self.rounded())
    }

    /// Add another amount of the same currency, `None` on mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Subtract another amount of the same currency, `None` on mismatch or overflow.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Money::new(amount, self.currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        assert_eq!(Money::new(dec("44.982"), Currency::EGP).display(), "EGP44.98");
        assert_eq!(Money::new(dec("4.995"), Currency::EGP).display(), "EGP5.00");
        assert_eq!(Money::new(dec("12"), Currency::USD).display(), "$12.00");
    }

    #[test]
    fn test_exact_arithmetic() {
        let a = Money::new(dec("49.98"), Currency::EGP);
        let b = Money::new(dec("4.998"), Currency::EGP);
        assert_eq!(a.try_subtract(&b).unwrap().amount, dec("44.982"));
        assert_eq!(a.try_add(&b).unwrap().amount, dec("54.978"));
    }

    #[test]
    fn test_currency_mismatch() {
        let egp = Money::new(dec("1"), Currency::EGP);
        let usd = Money::new(dec("1"), Currency::USD);
        assert!(egp.try_add(&usd).is_none());
        assert!(egp.try_subtract(&usd).is_none());
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::from_code("egp"), Some(Currency::EGP));
        assert_eq!(Currency::from_code("XYZ"), None);
        assert_eq!(Currency::default(), Currency::EGP);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero(Currency::EGP).is_zero());
        assert!(!Money::zero(Currency::EGP).is_negative());
        assert!(Money::new(dec("-0.01"), Currency::EGP).is_negative());
    }
}
