//! Auth-session model for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthBridge` owns a `Strategy` (the tagged union of who holds the
//! identity) and hands out `AuthSession` snapshots. Route guards and the UI
//! read the reactive `AuthState` signal fed from those snapshots.
//!
//! DESIGN
//! ======
//! Identity and token live only inside the strategy payloads, so "identity
//! implies a mode" and "session mode has no token" cannot be violated.
//! Strategy-specific behavior goes through `AuthStrategy`, implemented once
//! per variant.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;

use crate::idp::IdpClient;
use crate::net::api::AuthApi;

// =============================================================================
// SECRETS
// =============================================================================

/// Bearer access token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Username/password pair for the first-party login form.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Shared cell holding the newest delegated token.
///
/// The interceptor reads it on every send, so a silent renew is visible to
/// the very next request. Clones share the cell.
#[derive(Clone, Debug, Default)]
pub struct LiveToken(Rc<RefCell<Option<AccessToken>>>);

impl LiveToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<AccessToken> {
        self.0.borrow().clone()
    }

    pub fn set(&self, token: AccessToken) {
        *self.0.borrow_mut() = Some(token);
    }

    pub fn clear(&self) {
        *self.0.borrow_mut() = None;
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    None,
    Session,
    Oidc,
}

/// Read-only view of the process-wide auth state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub identity: Option<String>,
    pub mode: AuthMode,
    pub access_token: Option<AccessToken>,
    pub loading: bool,
    pub pending_delegated_signin: bool,
}

impl AuthSession {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    Initializing,
    Unauthenticated,
    AuthenticatedSession,
    AwaitingDelegatedAuth,
    AuthenticatedOidc,
    SigningOut,
}

impl AuthPhase {
    #[must_use]
    pub fn derive(session: &AuthSession, signing_out: bool) -> Self {
        if signing_out {
            return Self::SigningOut;
        }
        if session.pending_delegated_signin {
            return Self::AwaitingDelegatedAuth;
        }
        match (session.mode, session.identity.is_some()) {
            (AuthMode::Session, true) => Self::AuthenticatedSession,
            (AuthMode::Oidc, true) => Self::AuthenticatedOidc,
            _ if session.loading => Self::Initializing,
            _ => Self::Unauthenticated,
        }
    }
}

// =============================================================================
// STRATEGIES
// =============================================================================

#[async_trait::async_trait(?Send)]
pub(crate) trait AuthStrategy {
    fn mode(&self) -> AuthMode;
    fn identity(&self) -> Option<&str>;
    fn access_token(&self) -> Option<AccessToken>;
    /// Network half of sign-out. Local state is already cleared when this runs.
    async fn sign_out(&self, api: &AuthApi);
}

pub(crate) struct AnonymousStrategy;

pub(crate) struct SessionStrategy {
    pub identity: String,
}

/// Delegated mode. `identity` is `None` while the IdP is eligible but has not
/// reported a user yet.
pub(crate) struct OidcStrategy {
    pub identity: Option<String>,
    pub idp: Rc<dyn IdpClient>,
    pub token: LiveToken,
}

pub(crate) enum Strategy {
    Anonymous(AnonymousStrategy),
    Session(SessionStrategy),
    Oidc(OidcStrategy),
}

impl Strategy {
    pub(crate) fn anonymous() -> Self {
        Self::Anonymous(AnonymousStrategy)
    }

    pub(crate) fn as_dyn(&self) -> &dyn AuthStrategy {
        match self {
            Self::Anonymous(s) => s,
            Self::Session(s) => s,
            Self::Oidc(s) => s,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl AuthStrategy for AnonymousStrategy {
    fn mode(&self) -> AuthMode {
        AuthMode::None
    }

    fn identity(&self) -> Option<&str> {
        None
    }

    fn access_token(&self) -> Option<AccessToken> {
        None
    }

    async fn sign_out(&self, _api: &AuthApi) {}
}

#[async_trait::async_trait(?Send)]
impl AuthStrategy for SessionStrategy {
    fn mode(&self) -> AuthMode {
        AuthMode::Session
    }

    fn identity(&self) -> Option<&str> {
        Some(&self.identity)
    }

    fn access_token(&self) -> Option<AccessToken> {
        None
    }

    async fn sign_out(&self, api: &AuthApi) {
        api.logout().await;
    }
}

#[async_trait::async_trait(?Send)]
impl AuthStrategy for OidcStrategy {
    fn mode(&self) -> AuthMode {
        AuthMode::Oidc
    }

    fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn access_token(&self) -> Option<AccessToken> {
        self.token.get()
    }

    async fn sign_out(&self, _api: &AuthApi) {
        if self.identity.is_none() {
            return;
        }
        if let Err(e) = self.idp.signout_redirect().await {
            log::error!("OIDC signout failed: {e}");
        }
    }
}

// =============================================================================
// REACTIVE STATE
// =============================================================================

/// Authentication state tracking the current user and loading status.
///
/// Provided via context as `RwSignal<AuthState>`; updated from the bridge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<String>,
    pub mode: AuthMode,
    pub loading: bool,
}

impl From<&AuthSession> for AuthState {
    fn from(session: &AuthSession) -> Self {
        Self { user: session.identity.clone(), mode: session.mode, loading: session.loading }
    }
}

thread_local! {
    static BRIDGE: RefCell<Option<crate::state::bridge::AuthBridge>> = const { RefCell::new(None) };
}

/// Make `bridge` the app-wide facade and expose its state as a signal.
pub fn provide_auth(bridge: crate::state::bridge::AuthBridge) -> RwSignal<AuthState> {
    let signal = RwSignal::new(AuthState::from(&bridge.session()));
    bridge.subscribe(move |session| signal.set(AuthState::from(session)));
    BRIDGE.with(|slot| *slot.borrow_mut() = Some(bridge));
    provide_context(signal);
    signal
}

/// Run `f` against the installed facade; `None` before `provide_auth`.
pub fn with_bridge<R>(f: impl FnOnce(&crate::state::bridge::AuthBridge) -> R) -> Option<R> {
    BRIDGE.with(|slot| slot.borrow().as_ref().map(f))
}
