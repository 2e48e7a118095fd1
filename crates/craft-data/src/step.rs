//! Remote step tagging for semantic categorization.

use std::fmt;

/// The class of a remote step, which decides its time bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Reads of reference or history data.
    Read,
    /// Inserts, updates and deletes.
    Write,
    /// Calls to the auth provider.
    Auth,
    /// Calls to the email edge function.
    Email,
}

/// Every network call the storefront makes, tagged by what it does.
///
/// Tags show up in timeout errors and log events so a failure names the
/// step that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteStep {
    /// Product and category listing.
    Catalog,
    /// Active shipping regions.
    Regions,
    /// Promocode lookup by code.
    PromocodeLookup,
    /// Promocode usage re-check and increment.
    PromocodeUsage,
    /// Order header insert.
    OrderInsert,
    /// Order line item insert.
    OrderItemsInsert,
    /// Removal of a partially written order.
    OrderRollback,
    /// Order history for a signed-in user.
    OrderHistory,
    /// Profile read or upsert.
    Profile,
    /// Password sign-in.
    SignIn,
    /// Account creation.
    SignUp,
    /// Remote sign-out notification.
    SignOut,
    /// Transactional email dispatch or health check.
    Email,
}

impl RemoteStep {
    /// Get the class of this step.
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Catalog | Self::Regions | Self::PromocodeLookup | Self::OrderHistory => {
                StepKind::Read
            }
            Self::PromocodeUsage
            | Self::OrderInsert
            | Self::OrderItemsInsert
            | Self::OrderRollback
            | Self::Profile => StepKind::Write,
            Self::SignIn | Self::SignUp | Self::SignOut => StepKind::Auth,
            Self::Email => StepKind::Email,
        }
    }

    /// Check if a failure of this step fails the user action it belongs to.
    ///
    /// Sign-out and email are best effort: the action succeeds locally
    /// whatever the remote outcome.
    pub fn is_critical(&self) -> bool {
        !matches!(self, Self::SignOut | Self::Email | Self::OrderRollback)
    }

    /// Get the name of this step.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Regions => "regions",
            Self::PromocodeLookup => "promocode_lookup",
            Self::PromocodeUsage => "promocode_usage",
            Self::OrderInsert => "order_insert",
            Self::OrderItemsInsert => "order_items_insert",
            Self::OrderRollback => "order_rollback",
            Self::OrderHistory => "order_history",
            Self::Profile => "profile",
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::SignOut => "sign_out",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for RemoteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_kinds() {
        assert_eq!(RemoteStep::Catalog.kind(), StepKind::Read);
        assert_eq!(RemoteStep::OrderItemsInsert.kind(), StepKind::Write);
        assert_eq!(RemoteStep::SignOut.kind(), StepKind::Auth);
        assert_eq!(RemoteStep::Email.kind(), StepKind::Email);
    }

    #[test]
    fn test_best_effort_steps() {
        assert!(RemoteStep::OrderInsert.is_critical());
        assert!(!RemoteStep::SignOut.is_critical());
        assert!(!RemoteStep::Email.is_critical());
    }

    #[test]
    fn test_step_display() {
        assert_eq!(RemoteStep::PromocodeUsage.to_string(), "promocode_usage");
    }
}
