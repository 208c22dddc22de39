//! Networking modules for the portal HTTP API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` is the request seam, `interceptor` adds bearer credentials on
//! top of it, `api` holds the bridge's own auth calls, `config_fetcher` caches
//! the IdP configuration, `api_client` serves data loaders, and `types`
//! defines the shared wire schema.

pub mod api;
pub mod api_client;
pub mod config_fetcher;
pub mod interceptor;
pub mod transport;
pub mod types;
