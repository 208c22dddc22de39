//! Shared auth UI helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route components should apply identical unauthenticated redirect behavior:
//! remember where the user was headed, then send them to the login page.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::config::DEFAULT_LOGIN_PATH;
use crate::state::auth::{AuthState, with_bridge};
use crate::state::bridge::AuthBridge;

/// True once auth has settled without a user.
#[must_use]
pub fn should_redirect_unauth(state: &AuthState) -> bool {
    !state.loading && state.user.is_none()
}

/// Redirect to the login page whenever auth has loaded and no user is present.
pub fn install_unauth_redirect<F>(auth: RwSignal<AuthState>, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    let navigate = navigate.clone();
    Effect::new(move || {
        let state = auth.get();
        if should_redirect_unauth(&state) {
            let target = with_bridge(AuthBridge::login_redirect).unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_owned());
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });
}
