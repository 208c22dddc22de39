//! Translate IdP client signals into bridge events.
//!
//! DESIGN
//! ======
//! `IdpDelegate` is a small synchronous state machine: it remembers whether
//! the IdP is still loading and whether it last reported an authenticated
//! user, and maps every signal to zero or more `DelegateEvent`s. It never
//! touches facade state itself, which keeps it testable without a runtime.
//!
//! Every `UserLoaded` yields `TokenAvailable` (silent renew swaps tokens under
//! a stable identity); `Authenticated` is only emitted on the transition.

#[cfg(test)]
#[path = "delegate_test.rs"]
mod delegate_test;

use std::rc::Rc;

use super::{IdpClient, IdpProfile, IdpSignal, IdpSnapshot, IdpUser};
use crate::state::auth::AccessToken;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DelegateEvent {
    TokenAvailable(AccessToken),
    Authenticated(IdpProfile),
    Unauthenticated,
    /// Silent paths cannot continue; a fresh delegated sign-in is needed.
    InteractionRequired,
    SigninFailed(String),
}

pub struct IdpDelegate {
    client: Rc<dyn IdpClient>,
    loading: bool,
    authenticated: bool,
}

impl IdpDelegate {
    #[must_use]
    pub fn new(client: Rc<dyn IdpClient>) -> Self {
        Self { client, loading: true, authenticated: false }
    }

    #[must_use]
    pub fn client(&self) -> Rc<dyn IdpClient> {
        Rc::clone(&self.client)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Seed state right after connecting.
    ///
    /// `stored` is the IdP client's persisted record. When the client has not
    /// surfaced it yet, stay loading so gated views wait for the restore
    /// instead of flashing the login page.
    pub fn prime(&mut self, snapshot: IdpSnapshot, stored: Option<IdpUser>, now_secs: i64) -> Vec<DelegateEvent> {
        if let Some(user) = snapshot.user {
            return self.observe(IdpSignal::UserLoaded(user), now_secs);
        }
        match stored {
            Some(user) if user.is_expired(now_secs) => {
                log::info!("stored IdP session expired, re-authentication required");
                self.loading = false;
                vec![DelegateEvent::InteractionRequired]
            }
            Some(_) => {
                self.loading = true;
                Vec::new()
            }
            None => {
                self.loading = snapshot.loading;
                Vec::new()
            }
        }
    }

    /// Forget the last reported user after a local sign-out, so the next
    /// `UserLoaded` counts as a fresh authentication.
    pub fn reset(&mut self) {
        self.loading = false;
        self.authenticated = false;
    }

    pub fn observe(&mut self, signal: IdpSignal, now_secs: i64) -> Vec<DelegateEvent> {
        match signal {
            IdpSignal::LoadingChanged(loading) => {
                self.loading = loading;
                Vec::new()
            }
            IdpSignal::UserLoaded(user) => {
                self.loading = false;
                if user.is_expired(now_secs) {
                    log::info!("IdP reported an expired user, re-authentication required");
                    self.authenticated = false;
                    return vec![DelegateEvent::Unauthenticated, DelegateEvent::InteractionRequired];
                }
                let mut events = vec![DelegateEvent::TokenAvailable(user.token())];
                if !self.authenticated {
                    self.authenticated = true;
                    events.push(DelegateEvent::Authenticated(user.profile));
                }
                events
            }
            IdpSignal::UserUnloaded => {
                self.loading = false;
                self.authenticated = false;
                vec![DelegateEvent::Unauthenticated]
            }
            IdpSignal::AccessTokenExpired => {
                self.authenticated = false;
                vec![DelegateEvent::Unauthenticated, DelegateEvent::InteractionRequired]
            }
            IdpSignal::SilentRenewError(err) if err.is_interaction_required() => {
                log::info!("silent renew needs interaction: {err}");
                self.authenticated = false;
                vec![DelegateEvent::Unauthenticated, DelegateEvent::InteractionRequired]
            }
            IdpSignal::SilentRenewError(err) => {
                // Current token stays valid until it expires.
                log::warn!("silent renew failed: {err}");
                Vec::new()
            }
            IdpSignal::SigninError(err) => {
                log::error!("delegated sign-in failed: {err}");
                self.loading = false;
                self.authenticated = false;
                vec![DelegateEvent::SigninFailed(err.to_string())]
            }
        }
    }
}
