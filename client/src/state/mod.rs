//! Client-side auth state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `bridge` is the facade every view talks to; `auth` holds the strategy
//! model, the snapshot types and the reactive signal fed from the facade.

pub mod auth;
pub mod bridge;
