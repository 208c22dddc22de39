//! Bearer-injecting transport middleware.
//!
//! DESIGN
//! ======
//! `BearerInterceptor` wraps the real transport when the client is built. On
//! each send it reads the `LiveToken` cell; the cell is only filled while the
//! delegated strategy is active and is emptied on sign-out, so session-mode
//! and signed-out requests pass through untouched with no restore step.
//!
//! A header the caller set explicitly always wins, in any casing. Responses,
//! including 401, are returned as-is.

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod interceptor_test;

use super::transport::{ApiRequest, ApiResponse, CredentialsMode, HttpTransport, TransportError};
use crate::state::auth::LiveToken;

const AUTHORIZATION: &str = "Authorization";

pub struct BearerInterceptor<T> {
    inner: T,
    api_base: String,
    token: LiveToken,
}

impl<T: HttpTransport> BearerInterceptor<T> {
    #[must_use]
    pub fn new(inner: T, api_base: impl Into<String>, token: LiveToken) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_owned();
        Self { inner, api_base, token }
    }

    /// Decorate `request` if it qualifies; otherwise return it unchanged.
    #[must_use]
    pub fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        let Some(token) = self.token.get() else {
            return request;
        };
        if !is_under_base(&request.url, &self.api_base) || request.headers.contains(AUTHORIZATION) {
            return request;
        }
        request.headers.set(AUTHORIZATION, token.bearer());
        request.credentials = CredentialsMode::Include;
        request
    }
}

#[async_trait::async_trait(?Send)]
impl<T: HttpTransport> HttpTransport for BearerInterceptor<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let request = self.apply(request);
        self.inner.send(request).await
    }
}

/// `url` equals `base` or continues it at a path, query or fragment boundary.
fn is_under_base(url: &str, base: &str) -> bool {
    if base.is_empty() {
        return false;
    }
    url.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
}
