//! Landing page for the IdP redirect.
//!
//! The bridge does the work on this path: it skips the session probe, lets
//! the IdP client finish the code exchange, then replaces the location with
//! the remembered destination (or the login page on failure).

#[cfg(test)]
#[path = "oidc_callback_test.rs"]
mod oidc_callback_test;

use leptos::prelude::*;

use crate::error::AuthError;
use crate::state::auth::{AuthState, with_bridge};

pub(crate) fn callback_message(error: Option<&AuthError>) -> String {
    match error {
        Some(e) => format!("Sign-in failed: {e}"),
        None => "Signing you in...".to_owned(),
    }
}

#[component]
pub fn OidcCallbackPage() -> impl IntoView {
    let auth = use_context::<RwSignal<AuthState>>();
    let message = move || {
        if let Some(auth) = auth {
            auth.track();
        }
        let error = with_bridge(crate::state::bridge::AuthBridge::last_error).flatten();
        callback_message(error.as_ref())
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <p class="login-message">{message}</p>
            </div>
        </div>
    }
}
