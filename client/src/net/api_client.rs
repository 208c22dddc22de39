//! Data-fetching client for portal API resources.
//!
//! SYSTEM CONTEXT
//! ==============
//! Page loaders call these helpers. Requests go through whatever transport
//! the client was built with, normally a `BearerInterceptor`, so the caller
//! never handles tokens. A 401 becomes `ApiError::Unauthorized`; the loader
//! decides whether to send the user to `login_redirect_url`.

#[cfg(test)]
#[path = "api_client_test.rs"]
mod api_client_test;

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::transport::{ApiRequest, ApiResponse, HttpTransport, TransportError};
use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Rc<dyn HttpTransport>,
    config: ClientConfig,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Rc<dyn HttpTransport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// `GET {api_base}/{path}` decoded as JSON.
    ///
    /// # Errors
    ///
    /// `Unauthorized` on 401, `Status` on other non-2xx answers, `Transport`
    /// on network or decode failure.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = ApiRequest::get(self.config.endpoint(path)).header("Accept", "application/json");
        let resp = self.send(request).await?;
        Ok(resp.json()?)
    }

    /// `PUT {api_base}/{path}` with a JSON body, decoding the JSON reply.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get_json`].
    pub async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = ApiRequest::put(self.config.endpoint(path)).json(body)?;
        let resp = self.send(request).await?;
        Ok(resp.json()?)
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = request.url.clone();
        let resp = self.transport.send(request).await?;
        match resp.status {
            401 => {
                log::info!("{url} answered 401");
                Err(ApiError::Unauthorized)
            }
            _ if resp.ok() => Ok(resp),
            status => Err(ApiError::Status { status, body: resp.body }),
        }
    }
}

#[must_use]
pub fn login_redirect_url(login_path: &str, from_page: &str) -> String {
    format!("{login_path}?fromPage={}", urlencoding::encode(from_page))
}
