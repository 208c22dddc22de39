//! Delegated identity provider (OIDC) adapter.
//!
//! SYSTEM CONTEXT
//! ==============
//! The IdP client itself (authorization code + PKCE, its own token storage,
//! silent renew timers) is an opaque collaborator. The bridge only needs four
//! capabilities from it plus a stream of signals, captured by `IdpClient`.
//! `delegate` turns those signals into bridge events; `token_store` is the
//! typed accessor for the client's persisted user record.

pub mod delegate;
pub mod profile;
pub mod token_store;


use std::rc::Rc;

pub use delegate::{DelegateEvent, IdpDelegate};
pub use profile::{IdpProfile, IdpUser};

use crate::net::types::ConfigResponse;

/// IdP parameters served by `GET /config`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdpConfig {
    pub authority: String,
    pub client_id: String,
    pub scope: Option<String>,
    pub audience: Option<String>,
}

impl IdpConfig {
    /// Convert the wire payload; `None` when authority or client id is blank.
    #[must_use]
    pub fn from_response(resp: ConfigResponse) -> Option<Self> {
        let authority = resp.oidc_authority_url.trim().to_owned();
        let client_id = resp.oidc_client_id.trim().to_owned();
        if authority.is_empty() || client_id.is_empty() {
            return None;
        }
        Some(Self {
            authority,
            client_id,
            scope: resp.oidc_scope.filter(|s| !s.trim().is_empty()),
            audience: resp.oidc_audience.filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Everything needed to construct the IdP client for this origin. The client
/// keeps its user record in session storage, never in `localStorage`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdpSettings {
    pub authority: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub scope: String,
    pub resource: Option<String>,
    pub automatic_silent_renew: bool,
    pub monitor_session: bool,
}

pub const DEFAULT_SCOPE: &str = "openid profile email";

impl IdpSettings {
    #[must_use]
    pub fn new(config: &IdpConfig, origin: &str, callback_path: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            authority: config.authority.clone(),
            client_id: config.client_id.clone(),
            redirect_uri: format!("{origin}{callback_path}"),
            post_logout_redirect_uri: origin.to_owned(),
            scope: config.scope.clone().unwrap_or_else(|| DEFAULT_SCOPE.to_owned()),
            resource: config.audience.clone(),
            automatic_silent_renew: true,
            monitor_session: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdpError {
    /// OIDC error response (`error` + optional `error_description`).
    #[error("{code}: {description}")]
    Protocol { code: String, description: String },
    #[error("{0}")]
    Other(String),
}

const INTERACTION_REQUIRED_CODES: &[&str] =
    &["interaction_required", "login_required", "consent_required", "account_selection_required"];

impl IdpError {
    #[must_use]
    pub fn protocol(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Protocol { code: code.into(), description: description.into() }
    }

    /// True when the IdP needs the user in front of it; silent paths cannot recover.
    #[must_use]
    pub fn is_interaction_required(&self) -> bool {
        match self {
            Self::Protocol { code, .. } => INTERACTION_REQUIRED_CODES.contains(&code.as_str()),
            Self::Other(_) => false,
        }
    }
}

/// Point-in-time view of the IdP client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdpSnapshot {
    pub loading: bool,
    pub user: Option<IdpUser>,
}

/// Reactive notifications emitted by the IdP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdpSignal {
    LoadingChanged(bool),
    /// Initial restore, callback completion, or silent renew.
    UserLoaded(IdpUser),
    UserUnloaded,
    AccessTokenExpired,
    SilentRenewError(IdpError),
    /// The redirect callback came back with an error (denied, aborted).
    SigninError(IdpError),
}

pub type IdpSignalSink = Rc<dyn Fn(IdpSignal)>;

/// The opaque IdP client capability.
///
/// Implementations must not invoke the subscribed sink synchronously from
/// inside `subscribe`.
#[async_trait::async_trait(?Send)]
pub trait IdpClient {
    fn snapshot(&self) -> IdpSnapshot;
    fn subscribe(&self, sink: IdpSignalSink);
    /// Navigate to the IdP. In a browser this does not return on success.
    async fn signin_redirect(&self) -> Result<(), IdpError>;
    async fn signout_redirect(&self) -> Result<(), IdpError>;
    async fn signin_silent(&self) -> Result<IdpUser, IdpError>;
}

/// Builds the IdP client once `/config` is known.
pub trait IdpConnector {
    fn connect(&self, settings: &IdpSettings) -> Rc<dyn IdpClient>;
}
