//! Business-level auth errors surfaced by the facade.
//!
//! ERROR HANDLING
//! ==============
//! Infrastructure failures during bootstrap (probe, config load) never reach
//! this type; they are logged and mapped to "absent". What remains here is
//! what a login page or loader has to render or react to.

use crate::net::transport::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// `/config` failed or returned an unusable payload; delegated sign-in is off.
    #[error("identity provider configuration is unavailable")]
    ConfigUnavailable,
    /// Login succeeded but `/users/me` did not confirm a session.
    #[error("session could not be confirmed after login")]
    SessionProbeFailure,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("delegated sign-in failed: {0}")]
    DelegatedSigninFailed(String),
    /// Silent renew needs user interaction; a fresh delegated sign-in was started.
    #[error("token refresh requires interaction")]
    TokenRefreshInteractionRequired,
    #[error("unauthorized")]
    Unauthorized,
    #[error("a delegated sign-in is already in progress")]
    SigninPending,
    #[error("already signed in with a first-party session")]
    AlreadyAuthenticated,
    /// A sign-out ran while the sign-in was suspended; its result was dropped.
    #[error("sign-in was cancelled by sign-out")]
    SignedOut,
    #[error("network error: {0}")]
    Network(String),
}

impl From<TransportError> for AuthError {
    fn from(err: TransportError) -> Self {
        Self::Network(err.to_string())
    }
}
