//! `AuthBridge`: one facade over session-cookie and delegated OIDC sign-in.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected view asks this facade who the user is, whether it is still
//! loading, and how to sign in or out. Data loaders never see it directly:
//! they send through a `BearerInterceptor` that shares the bridge's
//! `LiveToken`.
//!
//! DESIGN
//! ======
//! Bootstrap probes `/users/me` first. A session found there wins and the IdP
//! is never contacted. Otherwise `/config` is loaded and, if it is usable, the
//! IdP client is connected and the delegated strategy becomes active with no
//! identity until the IdP reports a user.
//!
//! The redirect round-trip is two-phase. Phase 1 remembers the destination and
//! navigates to the IdP, which unloads the page. Phase 2 starts in a fresh
//! page on the callback path: the probe is skipped, the IdP client restores
//! the user, and the first identity seen triggers the post-login redirect.
//!
//! ERROR HANDLING
//! ==============
//! Probe and config failures only log. Operations a user started return
//! `AuthError` and also record it as `last_error` for the login and callback
//! pages. Sign-out always clears local state before any network call.
//!
//! TRADE-OFFS
//! ==========
//! All state is `Cell`/`RefCell` on one thread. No borrow is held across an
//! await, and listeners are called with a snapshot after borrows are dropped,
//! so a listener may call straight back into the bridge.

#[cfg(test)]
#[path = "bridge_test.rs"]
mod bridge_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::FutureExt;

use super::auth::{
    AccessToken, AuthMode, AuthPhase, AuthSession, Credentials, LiveToken, OidcStrategy, SessionStrategy, Strategy,
};
use crate::config::ClientConfig;
use crate::error::AuthError;
use crate::idp::token_store::load_stored_user;
use crate::idp::{DelegateEvent, IdpClient, IdpConfig, IdpConnector, IdpDelegate, IdpSettings, IdpSignal};
use crate::net::api::AuthApi;
use crate::net::api_client::{ApiClient, login_redirect_url};
use crate::net::config_fetcher::ConfigFetcher;
use crate::net::interceptor::BearerInterceptor;
use crate::net::transport::HttpTransport;
use crate::util::navigation::{Navigator, TaskSpawner, now_unix_secs};
use crate::util::redirect_memory::RedirectMemory;
use crate::util::storage::KeyValueStore;

type Listener = Rc<dyn Fn(&AuthSession)>;

/// Capabilities the bridge is built from.
pub struct BridgeDeps {
    pub config: ClientConfig,
    /// Plain transport for the bridge's own auth calls.
    pub transport: Rc<dyn HttpTransport>,
    /// Session-scoped storage shared with the IdP client.
    pub storage: Rc<dyn KeyValueStore>,
    pub navigator: Rc<dyn Navigator>,
    pub spawner: Rc<dyn TaskSpawner>,
    pub connector: Rc<dyn IdpConnector>,
}

#[cfg(feature = "hydrate")]
impl BridgeDeps {
    /// Browser wiring: `fetch`, `sessionStorage`, `window.location`, `spawn_local`.
    #[must_use]
    pub fn browser(config: ClientConfig, connector: Rc<dyn IdpConnector>) -> Self {
        use crate::net::transport::BrowserTransport;
        use crate::util::navigation::{BrowserNavigator, BrowserSpawner};
        use crate::util::storage::SessionStore;

        Self {
            config,
            transport: Rc::new(BrowserTransport),
            storage: Rc::new(SessionStore),
            navigator: Rc::new(BrowserNavigator),
            spawner: Rc::new(BrowserSpawner),
            connector,
        }
    }
}

/// Cheap to clone; clones share one state.
#[derive(Clone)]
pub struct AuthBridge {
    inner: Rc<BridgeInner>,
}

struct BridgeInner {
    config: ClientConfig,
    api: AuthApi,
    config_fetcher: ConfigFetcher,
    storage: Rc<dyn KeyValueStore>,
    navigator: Rc<dyn Navigator>,
    spawner: Rc<dyn TaskSpawner>,
    connector: Rc<dyn IdpConnector>,
    redirects: RedirectMemory,
    token: LiveToken,
    strategy: RefCell<Strategy>,
    delegate: RefCell<Option<IdpDelegate>>,
    initializing: Cell<bool>,
    pending: Cell<bool>,
    signing_out: Cell<bool>,
    /// Bumped by every sign-out; sign-ins started under an older value never commit.
    signout_epoch: Cell<u64>,
    alive: Cell<bool>,
    last_error: RefCell<Option<AuthError>>,
    listeners: RefCell<Vec<Listener>>,
}

impl AuthBridge {
    #[must_use]
    pub fn new(deps: BridgeDeps) -> Self {
        let api = AuthApi::new(Rc::clone(&deps.transport), &deps.config);
        let config_fetcher = ConfigFetcher::new(Rc::clone(&deps.transport), api.config_url());
        let redirects = RedirectMemory::new(
            Rc::clone(&deps.storage),
            deps.config.callback_path.clone(),
            deps.config.root_path.clone(),
        );
        Self {
            inner: Rc::new(BridgeInner {
                config: deps.config,
                api,
                config_fetcher,
                storage: deps.storage,
                navigator: deps.navigator,
                spawner: deps.spawner,
                connector: deps.connector,
                redirects,
                token: LiveToken::new(),
                strategy: RefCell::new(Strategy::anonymous()),
                delegate: RefCell::new(None),
                initializing: Cell::new(true),
                pending: Cell::new(false),
                signing_out: Cell::new(false),
                signout_epoch: Cell::new(0),
                alive: Cell::new(true),
                last_error: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Spawn `initialize` in the background.
    pub fn start(&self) {
        let bridge = self.clone();
        self.inner.spawner.spawn(async move { bridge.initialize().await }.boxed_local());
    }

    /// Stop committing results from in-flight work.
    pub fn dispose(&self) {
        self.inner.alive.set(false);
        self.inner.listeners.borrow_mut().clear();
    }

    /// Settle the active strategy. `loading` stays true until this returns.
    pub async fn initialize(&self) {
        let inner = &self.inner;
        let path = inner.navigator.current_path();
        let on_callback = inner.config.is_callback_path(&path);

        if on_callback {
            log::info!("resuming delegated sign-in on {path}");
        } else {
            let probed = inner.api.probe_session().await;
            if !inner.alive.get() {
                return;
            }
            if let Some(identity) = probed {
                log::info!("existing session found");
                inner.initializing.set(false);
                self.establish_session(identity);
                return;
            }
        }

        let config = inner.config_fetcher.load().await;
        if !inner.alive.get() {
            return;
        }
        inner.initializing.set(false);
        match config {
            Some(config) => self.connect_delegate(&config),
            None => {
                log::info!("delegated sign-in unavailable");
                if on_callback {
                    *inner.last_error.borrow_mut() = Some(AuthError::ConfigUnavailable);
                    inner.navigator.replace(&inner.config.login_path);
                }
            }
        }
        self.notify();
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// First-party sign-in: post the form, then re-probe for the identity.
    ///
    /// # Errors
    ///
    /// `SigninPending` while a delegated sign-in is underway,
    /// `InvalidCredentials` when the login endpoint rejects, `Network` when it
    /// cannot be reached, `SessionProbeFailure` when the login succeeded but
    /// `/users/me` does not confirm it, `SignedOut` when `signout` ran first.
    pub async fn signin(&self, credentials: &Credentials) -> Result<(), AuthError> {
        if self.inner.pending.get() {
            return Err(AuthError::SigninPending);
        }
        let result = self.signin_session(credentials).await;
        match &result {
            Err(AuthError::SignedOut) => log::info!("sign-in dropped after sign-out"),
            Err(err) => self.fail(err.clone()),
            Ok(()) => {}
        }
        result
    }

    async fn signin_session(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let epoch = self.inner.signout_epoch.get();
        self.inner.api.login(credentials).await?;
        self.ensure_not_signed_out(epoch)?;
        let identity = self.inner.api.probe_session().await.ok_or(AuthError::SessionProbeFailure)?;
        self.ensure_not_signed_out(epoch)?;
        self.establish_session(identity);
        Ok(())
    }

    fn ensure_not_signed_out(&self, epoch: u64) -> Result<(), AuthError> {
        if self.inner.signout_epoch.get() == epoch {
            Ok(())
        } else {
            Err(AuthError::SignedOut)
        }
    }

    /// Start a delegated sign-in. Returns once the redirect is scheduled.
    ///
    /// # Errors
    ///
    /// `SigninPending` if one is already scheduled, `AlreadyAuthenticated`
    /// under a first-party session, `ConfigUnavailable` when the IdP
    /// configuration cannot be loaded, `SignedOut` when `signout` ran while
    /// the configuration was loading.
    pub async fn signin_delegated(&self) -> Result<(), AuthError> {
        let inner = &self.inner;
        self.check_delegated_signin()?;
        if self.is_authenticated() {
            return Ok(());
        }

        if inner.delegate.borrow().is_none() {
            let epoch = inner.signout_epoch.get();
            let config = inner.config_fetcher.retry().await;
            if let Err(err) = self.ensure_not_signed_out(epoch) {
                log::info!("delegated sign-in dropped after sign-out");
                return Err(err);
            }
            let Some(config) = config else {
                self.fail(AuthError::ConfigUnavailable);
                return Err(AuthError::ConfigUnavailable);
            };
            self.connect_delegate(&config);
            self.check_delegated_signin()?;
            if self.is_authenticated() {
                return Ok(());
            }
        }

        let Some(client) = inner.delegate.borrow().as_ref().map(IdpDelegate::client) else {
            return Err(AuthError::ConfigUnavailable);
        };
        self.activate_oidc(Rc::clone(&client));

        let path = inner.navigator.current_path();
        if !self.is_auth_page(&path) {
            inner.redirects.remember(&path);
        }
        inner.pending.set(true);
        inner.last_error.borrow_mut().take();
        self.notify();

        let bridge = self.clone();
        let epoch = inner.signout_epoch.get();
        inner
            .spawner
            .spawn(async move { bridge.drive_redirect(client, epoch).await }.boxed_local());
        Ok(())
    }

    fn check_delegated_signin(&self) -> Result<(), AuthError> {
        if self.inner.pending.get() {
            return Err(AuthError::SigninPending);
        }
        if matches!(*self.inner.strategy.borrow(), Strategy::Session(_)) {
            return Err(AuthError::AlreadyAuthenticated);
        }
        Ok(())
    }

    async fn drive_redirect(&self, client: Rc<dyn IdpClient>, epoch: u64) {
        if self.ensure_not_signed_out(epoch).is_err() {
            log::info!("signed out before the IdP redirect started");
            return;
        }
        log::info!("redirecting to identity provider");
        let result = client.signin_redirect().await;
        if !self.inner.alive.get() {
            return;
        }
        self.inner.pending.set(false);
        match result {
            Ok(()) => self.notify(),
            Err(e) => {
                log::error!("signin redirect failed: {e}");
                self.fail(AuthError::DelegatedSigninFailed(e.to_string()));
            }
        }
    }

    /// Sign out of whichever strategy is active.
    pub async fn signout(&self) {
        self.signout_with(|| {}).await;
    }

    /// Sign out, then run `callback`. Local state is cleared before any
    /// network call, and network failures never block the callback.
    pub async fn signout_with(&self, callback: impl FnOnce()) {
        let inner = &self.inner;
        inner.signout_epoch.set(inner.signout_epoch.get().wrapping_add(1));
        let previous = inner.strategy.replace(Strategy::anonymous());
        inner.token.clear();
        inner.pending.set(false);
        self.reset_delegate();
        inner.signing_out.set(true);
        self.notify();

        log::info!("signing out ({:?})", previous.as_dyn().mode());
        previous.as_dyn().sign_out(&inner.api).await;

        inner.signing_out.set(false);
        self.notify();
        callback();
    }

    /// Ask the IdP for a silent renew.
    ///
    /// # Errors
    ///
    /// `Unauthorized` outside delegated mode, `TokenRefreshInteractionRequired`
    /// when the IdP needs the user (a fresh delegated sign-in is started),
    /// `Network` for other renew failures.
    pub async fn renew_token(&self) -> Result<AccessToken, AuthError> {
        let client = match &*self.inner.strategy.borrow() {
            Strategy::Oidc(oidc) => Rc::clone(&oidc.idp),
            _ => return Err(AuthError::Unauthorized),
        };
        match client.signin_silent().await {
            Ok(user) => {
                self.handle_idp_signal(IdpSignal::UserLoaded(user));
                self.access_token().ok_or(AuthError::Unauthorized)
            }
            Err(e) if e.is_interaction_required() => {
                self.handle_idp_signal(IdpSignal::SilentRenewError(e));
                Err(AuthError::TokenRefreshInteractionRequired)
            }
            Err(e) => {
                log::warn!("silent renew failed: {e}");
                Err(AuthError::Network(e.to_string()))
            }
        }
    }

    // =========================================================================
    // READ-ONLY VIEWS
    // =========================================================================

    /// Cached delegated token. Never triggers a refresh.
    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.inner.strategy.borrow().as_dyn().access_token()
    }

    #[must_use]
    pub fn identity(&self) -> Option<String> {
        self.inner.strategy.borrow().as_dyn().identity().map(str::to_owned)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.strategy.borrow().as_dyn().identity().is_some()
    }

    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.inner.strategy.borrow().as_dyn().mode()
    }

    /// True until bootstrap settles, and while the IdP client is still
    /// restoring a user in delegated mode.
    #[must_use]
    pub fn loading(&self) -> bool {
        if self.inner.initializing.get() {
            return true;
        }
        let waiting_on_idp = matches!(&*self.inner.strategy.borrow(), Strategy::Oidc(o) if o.identity.is_none());
        waiting_on_idp && self.inner.delegate.borrow().as_ref().is_some_and(IdpDelegate::is_loading)
    }

    #[must_use]
    pub fn session(&self) -> AuthSession {
        let (identity, mode, access_token) = {
            let strategy = self.inner.strategy.borrow();
            let s = strategy.as_dyn();
            (s.identity().map(str::to_owned), s.mode(), s.access_token())
        };
        AuthSession {
            identity,
            mode,
            access_token,
            loading: self.loading(),
            pending_delegated_signin: self.inner.pending.get(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        AuthPhase::derive(&self.session(), self.inner.signing_out.get())
    }

    #[must_use]
    pub fn last_error(&self) -> Option<AuthError> {
        self.inner.last_error.borrow().clone()
    }

    #[must_use]
    pub fn redirects(&self) -> &RedirectMemory {
        &self.inner.redirects
    }

    /// Token cell to hand to a `BearerInterceptor`.
    #[must_use]
    pub fn live_token(&self) -> LiveToken {
        self.inner.token.clone()
    }

    /// Data client whose requests carry the delegated bearer token.
    #[must_use]
    pub fn api_client(&self, transport: Rc<dyn HttpTransport>) -> ApiClient {
        let interceptor = BearerInterceptor::new(transport, self.inner.config.api_base_url.clone(), self.live_token());
        ApiClient::new(Rc::new(interceptor), self.inner.config.clone())
    }

    /// Remember the current page for after sign-in and return the login URL
    /// that points back at it.
    pub fn login_redirect(&self) -> String {
        let config = &self.inner.config;
        let path = self.inner.navigator.current_path();
        if self.is_auth_page(&path) {
            return config.login_path.clone();
        }
        self.inner.redirects.remember(&path);
        login_redirect_url(&config.login_path, &path)
    }

    /// Call `listener` with a fresh snapshot after every state change.
    pub fn subscribe(&self, listener: impl Fn(&AuthSession) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    // =========================================================================
    // STATE TRANSITIONS
    // =========================================================================

    fn notify(&self) {
        let listeners = self.inner.listeners.borrow().clone();
        if listeners.is_empty() {
            return;
        }
        let session = self.session();
        for listener in listeners {
            listener(&session);
        }
    }

    fn fail(&self, err: AuthError) {
        *self.inner.last_error.borrow_mut() = Some(err);
        self.notify();
    }

    fn establish_session(&self, identity: String) {
        let was_authenticated = self.is_authenticated();
        self.inner.token.clear();
        self.inner.strategy.replace(Strategy::Session(SessionStrategy { identity }));
        self.inner.last_error.borrow_mut().take();
        self.notify();
        if !was_authenticated {
            self.redirect_after_login();
        }
    }

    /// Make the delegated strategy active unless a session already owns the user.
    fn activate_oidc(&self, idp: Rc<dyn IdpClient>) {
        let mut strategy = self.inner.strategy.borrow_mut();
        if matches!(*strategy, Strategy::Anonymous(_)) {
            *strategy = Strategy::Oidc(OidcStrategy { identity: None, idp, token: self.inner.token.clone() });
        }
    }

    /// Connect the IdP client once, subscribe to it, and seed the delegate.
    fn connect_delegate(&self, config: &IdpConfig) {
        let inner = &self.inner;
        if inner.delegate.borrow().is_some() {
            return;
        }
        let settings = IdpSettings::new(config, &inner.navigator.origin(), &inner.config.callback_path);
        let client = inner.connector.connect(&settings);

        let weak = Rc::downgrade(&self.inner);
        client.subscribe(Rc::new(move |signal: IdpSignal| {
            if let Some(inner) = weak.upgrade() {
                AuthBridge { inner }.handle_idp_signal(signal);
            }
        }));

        let stored = load_stored_user(inner.storage.as_ref(), &settings);
        let mut delegate = IdpDelegate::new(Rc::clone(&client));
        let events = delegate.prime(client.snapshot(), stored, now_unix_secs());
        *inner.delegate.borrow_mut() = Some(delegate);

        self.activate_oidc(client);
        self.apply_events(events);
        self.notify();
    }

    fn handle_idp_signal(&self, signal: IdpSignal) {
        if !self.inner.alive.get() {
            return;
        }
        let events = {
            let mut slot = self.inner.delegate.borrow_mut();
            let Some(delegate) = slot.as_mut() else {
                return;
            };
            delegate.observe(signal, now_unix_secs())
        };
        self.apply_events(events);
        self.notify();
    }

    fn apply_events(&self, events: Vec<DelegateEvent>) {
        for event in events {
            match event {
                DelegateEvent::TokenAvailable(token) => {
                    if self.mode() == AuthMode::Oidc {
                        self.inner.token.set(token);
                    }
                }
                DelegateEvent::Authenticated(profile) => {
                    if self.mode() != AuthMode::Oidc {
                        // Not adopted outside delegated mode; the next user counts as fresh.
                        self.reset_delegate();
                        continue;
                    }
                    let Some(identity) = profile.identity() else {
                        log::warn!("IdP profile has no usable identity claim");
                        continue;
                    };
                    if self.set_oidc_identity(Some(identity)) {
                        log::info!("delegated sign-in complete");
                        self.inner.pending.set(false);
                        self.inner.last_error.borrow_mut().take();
                        self.redirect_after_login();
                    }
                }
                DelegateEvent::Unauthenticated => {
                    if self.mode() == AuthMode::Oidc {
                        self.set_oidc_identity(None);
                        self.inner.token.clear();
                    }
                }
                DelegateEvent::InteractionRequired => self.restart_delegated(),
                DelegateEvent::SigninFailed(reason) => {
                    self.inner.pending.set(false);
                    *self.inner.last_error.borrow_mut() = Some(AuthError::DelegatedSigninFailed(reason));
                    let path = self.inner.navigator.current_path();
                    if self.inner.config.is_callback_path(&path) {
                        self.inner.navigator.replace(&self.inner.config.login_path);
                    }
                }
            }
        }
    }

    fn reset_delegate(&self) {
        if let Some(delegate) = self.inner.delegate.borrow_mut().as_mut() {
            delegate.reset();
        }
    }

    /// Returns true on an absent-to-present identity transition.
    fn set_oidc_identity(&self, identity: Option<String>) -> bool {
        let mut strategy = self.inner.strategy.borrow_mut();
        let Strategy::Oidc(oidc) = &mut *strategy else {
            return false;
        };
        let became_authenticated = oidc.identity.is_none() && identity.is_some();
        oidc.identity = identity;
        became_authenticated
    }

    /// Silent paths gave up; send the user back through the IdP.
    fn restart_delegated(&self) {
        if self.mode() != AuthMode::Oidc {
            return;
        }
        let path = self.inner.navigator.current_path();
        if self.is_auth_page(&path) {
            log::debug!("interaction required on {path}; leaving sign-in to the user");
            return;
        }
        self.inner.redirects.remember(&path);
        let bridge = self.clone();
        self.inner.spawner.spawn(
            async move {
                if let Err(e) = bridge.signin_delegated().await {
                    log::warn!("automatic delegated sign-in not started: {e}");
                }
            }
            .boxed_local(),
        );
    }

    fn redirect_after_login(&self) {
        let config = &self.inner.config;
        let current = self.inner.navigator.current_path();
        match self.inner.redirects.consume() {
            Some(target) if target != current => self.inner.navigator.replace(&target),
            Some(_) => {}
            None if self.is_auth_page(&current) => self.inner.navigator.replace(&config.root_path),
            None => {}
        }
    }

    fn is_auth_page(&self, path: &str) -> bool {
        self.inner.config.is_login_path(path) || self.inner.config.is_callback_path(path)
    }
}
