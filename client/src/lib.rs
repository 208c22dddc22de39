//! # portal-client
//!
//! Leptos + WASM client layer for the admin portal. The interesting part is
//! the authentication bridge: one facade over a first-party cookie session and
//! a delegated OIDC identity provider, plus the bearer-injecting transport and
//! the redirect memory that survives the IdP round-trip.
//!
//! SYSTEM CONTEXT
//! ==============
//! Browser capabilities (HTTP, session storage, location, task spawning, the
//! IdP client) are reached through traits. Their browser implementations are
//! compiled with the `hydrate` feature; tests drive the same code with fakes.
//!
//! The application shell owns the wiring: it calls `init_logging`, builds an
//! `AuthBridge` from `BridgeDeps::browser` with its own `IdpConnector` around
//! the OIDC client library, hands the bridge to `provide_auth`, and calls
//! `start`. This crate ships no `IdpConnector` of its own.

pub mod config;
pub mod error;
pub mod idp;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use error::AuthError;
pub use state::bridge::{AuthBridge, BridgeDeps};

/// Install the console logger and panic hook. Safe to call more than once.
#[cfg(feature = "hydrate")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
}
