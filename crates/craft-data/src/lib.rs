//! Remote-call plumbing for the CoffeeCraft storefront.
//!
//! This crate provides:
//! - `RemoteStep` - Semantic tags for every network call the storefront makes
//! - `TimeoutConfig` - Per-step time bounds
//! - `with_timeout` - The single timeout wrapper used by every remote step
//! - `FetchClient` - JSON over HTTP against the hosted backend
//! - `EmailFunctionClient` - The transactional email edge function

mod client;
mod email;
mod step;
mod timeout;

pub use client::*;
pub use email::*;
pub use step::*;
pub use timeout::*;
