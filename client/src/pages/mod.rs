//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration and talks to the installed
//! `AuthBridge`; routing tables live with the application shell.

pub mod login;
pub mod oidc_callback;
