//! Login page supporting username/password and delegated SSO sign-in.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;

use crate::state::auth::Credentials;
use crate::util::redirect_memory::is_local_path;
#[cfg(feature = "hydrate")]
use crate::state::auth::with_bridge;
#[cfg(feature = "hydrate")]
use crate::state::bridge::AuthBridge;

/// Trim the username and require both fields.
pub(crate) fn validate_credentials_input(username: &str, password: &str) -> Result<Credentials, &'static str> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err("Enter both username and password.");
    }
    Ok(Credentials::new(username, password))
}

/// Decode `fromPage` out of a location search string like `?fromPage=%2Fteams`.
pub(crate) fn from_page_param(search: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "fromPage")
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
        .filter(|value| is_local_path(value))
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let username = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);

    #[cfg(feature = "hydrate")]
    {
        let search = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();
        if let Some(page) = from_page_param(&search) {
            with_bridge(|bridge| bridge.redirects().remember(&page));
        }
    }

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let credentials = match validate_credentials_input(&username.get(), &password.get()) {
            Ok(credentials) => credentials,
            Err(msg) => {
                info.set(msg.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Signing in...".to_owned());

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let Some(bridge) = with_bridge(AuthBridge::clone) else {
                info.set("Sign-in is not ready yet.".to_owned());
                busy.set(false);
                return;
            };
            if let Err(e) = bridge.signin(&credentials).await {
                info.set(e.to_string());
                busy.set(false);
            }
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = credentials;
    };

    let on_sso = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        busy.set(true);
        info.set("Redirecting to your identity provider...".to_owned());

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let Some(bridge) = with_bridge(AuthBridge::clone) else {
                busy.set(false);
                return;
            };
            if let Err(e) = bridge.signin_delegated().await {
                info.set(e.to_string());
                busy.set(false);
            }
        });
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Portal"</h1>
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="text"
                        autocomplete="username"
                        placeholder="Username"
                        prop:value=move || username.get()
                        on:input=move |ev| username.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        autocomplete="current-password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        "Log in"
                    </button>
                </form>
                <div class="login-divider"></div>
                <button class="login-button" type="button" on:click=on_sso disabled=move || busy.get()>
                    "Log in with SSO"
                </button>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
            </div>
        </div>
    }
}
