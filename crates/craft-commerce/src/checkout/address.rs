//! Checkout form, field validation and the shipping address snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::checkout::PaymentMethod;
use crate::profile::Profile;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").ok());

/// Check the loose `local@domain.tld` shape used by the storefront.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(email))
}

/// A checkout form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FullName,
    Email,
    Phone,
    Address,
    City,
    Region,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FullName => "fullName",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Address => "address",
            Field::City => "city",
            Field::Region => "region",
        }
    }

    /// Label shown next to the field.
    pub fn label(&self) -> &'static str {
        match self {
            Field::FullName => "Full name",
            Field::Email => "Email",
            Field::Phone => "Phone number",
            Field::Address => "Address",
            Field::City => "City",
            Field::Region => "Region",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every violation found in a form, one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message. The first message for a field is kept.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{}: {}", field, msg)).collect();
        f.write_str(&parts.join(", "))
    }
}

/// Raw checkout form input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl ShippingForm {
    /// Pre-fill from a stored profile and the account email.
    pub fn from_profile(profile: &Profile, email: Option<&str>) -> Self {
        Self {
            full_name: profile.full_name.clone().unwrap_or_default(),
            email: email.unwrap_or_default().to_string(),
            phone: profile.phone.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            city: profile.city.clone().unwrap_or_default(),
            notes: None,
            payment_method: PaymentMethod::default(),
        }
    }

    /// Check the contact fields, collecting every violation.
    ///
    /// The region is checked by the checkout, which owns the selection.
    pub fn check(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.full_name.trim().is_empty() {
            errors.insert(Field::FullName, "Full name is required");
        }
        if self.email.trim().is_empty() {
            errors.insert(Field::Email, "Email is required");
        } else if !is_valid_email(self.email.trim()) {
            errors.insert(Field::Email, "Email is invalid");
        }
        if self.phone.trim().is_empty() {
            errors.insert(Field::Phone, "Phone number is required");
        }
        if self.address.trim().is_empty() {
            errors.insert(Field::Address, "Address is required");
        }
        if self.city.trim().is_empty() {
            errors.insert(Field::City, "City is required");
        }

        errors
    }

    /// Snapshot of the trimmed form, stored with the order.
    pub fn to_address(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            order_notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }
}

/// Shipping details copied into the order header.
///
/// A value, not a reference to the profile: later profile edits never
/// change a placed order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub order_notes: Option<String>,
}

impl ShippingAddress {
    /// Format as single line.
    pub fn one_line(&self) -> String {
        format!("{}, {}", self.address, self.city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ShippingForm {
        ShippingForm {
            full_name: "Mona Adel".into(),
            email: "mona@example.com".into(),
            phone: "01000000000".into(),
            address: "12 Tahrir St".into(),
            city: "Cairo".into(),
            notes: Some("  ring twice ".into()),
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("plainaddress"));
    }

    #[test]
    fn test_collects_all_violations() {
        let form = ShippingForm {
            email: "not-an-email".into(),
            ..ShippingForm::default()
        };
        let errors = form.check();

        assert_eq!(errors.len(), 5);
        assert_eq!(errors.get(Field::Email), Some("Email is invalid"));
        assert_eq!(errors.get(Field::FullName), Some("Full name is required"));
        assert_eq!(errors.get(Field::Phone), Some("Phone number is required"));
        assert!(!errors.contains(Field::Region));
    }

    #[test]
    fn test_blank_email_is_required_not_invalid() {
        let form = ShippingForm {
            email: "   ".into(),
            ..filled()
        };
        assert_eq!(form.check().get(Field::Email), Some("Email is required"));
    }

    #[test]
    fn test_snapshot_shape() {
        let address = filled().to_address();
        assert_eq!(address.order_notes.as_deref(), Some("ring twice"));

        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["fullName"], "Mona Adel");
        assert_eq!(json["orderNotes"], "ring twice");
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::City, "City is required");
        errors.insert(Field::City, "ignored");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({ "city": "City is required" })
        );
    }

    #[test]
    fn test_prefill_from_profile() {
        let profile = Profile::new("u1").with_full_name("Mona Adel").with_city("Cairo");
        let form = ShippingForm::from_profile(&profile, Some("mona@example.com"));
        assert_eq!(form.full_name, "Mona Adel");
        assert_eq!(form.email, "mona@example.com");
        assert!(form.phone.is_empty());
    }
}
