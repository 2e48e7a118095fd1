//! Authentication for the CoffeeCraft storefront.
//!
//! Wraps the hosted auth provider behind the [`AuthProvider`] trait and
//! keeps the client-side session in a [`SessionAdapter`]: persisted in the
//! durable cache, observable through a watch channel, and cleared on
//! sign-out whatever the provider answers.

mod adapter;
mod error;
mod http;
mod provider;
mod session;

pub use adapter::{SessionAdapter, SignUpOutcome};
pub use error::AuthError;
pub use http::HttpAuthProvider;
pub use provider::AuthProvider;
pub use session::{AuthSession, AuthUser, SignUpResult};
