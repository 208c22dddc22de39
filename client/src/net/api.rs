//! REST calls the auth bridge makes on its own behalf.
//!
//! ERROR HANDLING
//! ==============
//! Probing and config loading swallow every failure into `None` (with a log
//! line): no session and no IdP are normal states, not crashes. Only the
//! login call returns a distinguished error, because the login form has to
//! tell the user their password was wrong.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::rc::Rc;

use super::transport::{ApiRequest, CredentialsMode, HttpTransport};
use super::types::{ConfigResponse, CurrentUser};
use crate::config::ClientConfig;
use crate::error::AuthError;
use crate::idp::IdpConfig;
use crate::state::auth::Credentials;

fn config_request_failed_message(status: u16) -> String {
    format!("/config returned non-OK status: {status}")
}

fn probe_failed_message(status: u16) -> String {
    format!("no active session (status {status})")
}

/// Endpoints used by the bridge, resolved once against the API base.
#[derive(Clone)]
pub struct AuthApi {
    transport: Rc<dyn HttpTransport>,
    config_url: String,
    me_url: String,
    login_url: String,
    logout_url: String,
}

impl AuthApi {
    #[must_use]
    pub fn new(transport: Rc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            config_url: config.endpoint("config"),
            me_url: config.endpoint("users/me"),
            login_url: config.endpoint("auth/login"),
            logout_url: config.endpoint("auth/logout"),
        }
    }

    #[must_use]
    pub fn config_url(&self) -> &str {
        &self.config_url
    }

    /// `GET /users/me` with cookies; the session identity, or `None`.
    pub async fn probe_session(&self) -> Option<String> {
        let request = ApiRequest::get(&self.me_url).credentials(CredentialsMode::Include);
        let resp = match self.transport.send(request).await {
            Ok(resp) => resp,
            Err(e) => {
                log::debug!("session probe failed: {e}");
                return None;
            }
        };
        if resp.status != 200 {
            log::debug!("{}", probe_failed_message(resp.status));
            return None;
        }
        match resp.json::<CurrentUser>() {
            Ok(user) => Some(user.email.trim().to_owned()).filter(|email| !email.is_empty()),
            Err(e) => {
                log::warn!("unexpected /users/me body: {e}");
                None
            }
        }
    }

    /// `POST /auth/login` with a form body.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` on any non-200 answer, `Network` when the request
    /// never completed.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let request = ApiRequest::post(&self.login_url)
            .credentials(CredentialsMode::Include)
            .form(&[("username", credentials.username()), ("password", credentials.password())]);
        let resp = self.transport.send(request).await?;
        if resp.status != 200 {
            log::info!("login rejected with status {}", resp.status);
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    /// `POST /auth/logout`. Best-effort; the outcome is only logged.
    pub async fn logout(&self) {
        let request = ApiRequest::post(&self.logout_url).credentials(CredentialsMode::Include);
        match self.transport.send(request).await {
            Ok(resp) if resp.ok() => {}
            Ok(resp) => log::warn!("logout returned status {}", resp.status),
            Err(e) => log::warn!("logout request failed: {e}"),
        }
    }
}

/// `GET /config`. Owns its inputs so the future can be shared.
pub(crate) async fn fetch_idp_config(transport: Rc<dyn HttpTransport>, url: String) -> Option<IdpConfig> {
    let resp = match transport.send(ApiRequest::get(url)).await {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("failed to load OIDC config: {e}");
            return None;
        }
    };
    if !resp.ok() {
        log::warn!("{}", config_request_failed_message(resp.status));
        return None;
    }
    let body = match resp.json::<ConfigResponse>() {
        Ok(body) => body,
        Err(e) => {
            log::warn!("unexpected /config body: {e}");
            return None;
        }
    };
    let config = IdpConfig::from_response(body);
    if config.is_none() {
        log::warn!("/config is missing the OIDC authority or client id");
    }
    config
}
