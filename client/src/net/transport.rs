//! HTTP transport seam.
//!
//! DESIGN
//! ======
//! Every outgoing call is an `ApiRequest` handed to an `HttpTransport`.
//! Middleware (bearer injection) wraps a transport instead of patching a
//! global request function, so what a request carries is decided where the
//! client is constructed.
//!
//! Client-side (hydrate): `BrowserTransport` sends through `gloo-net`.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("response decode failed: {0}")]
    Decode(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Mirrors the fetch `credentials` option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CredentialsMode {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// Ordered header list with case-insensitive lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace any existing value for `name` (any casing).
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.0.push((name.to_owned(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
    pub credentials: CredentialsMode,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Headers::new(), body: None, credentials: CredentialsMode::default() }
    }

    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    #[must_use]
    pub fn credentials(mut self, mode: CredentialsMode) -> Self {
        self.credentials = mode;
        self
    }

    /// Attach an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let encoded = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.headers.set("Content-Type", "application/x-www-form-urlencoded");
        self.body = Some(encoded);
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Decode` if `value` cannot be serialized.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, TransportError> {
        let body = serde_json::to_string(value).map_err(|e| TransportError::Decode(e.to_string()))?;
        self.headers.set("Content-Type", "application/json");
        self.body = Some(body);
        Ok(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Decode` when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Anything that can execute an `ApiRequest`.
#[async_trait::async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait::async_trait(?Send)]
impl<T: HttpTransport + ?Sized> HttpTransport for std::rc::Rc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request).await
    }
}

/// `fetch`-backed transport for the browser.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTransport;

#[cfg(feature = "hydrate")]
#[async_trait::async_trait(?Send)]
impl HttpTransport for BrowserTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        use gloo_net::http::Request;

        let mut builder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
            Method::Put => Request::put(&request.url),
            Method::Delete => Request::delete(&request.url),
        };
        builder = builder.credentials(match request.credentials {
            CredentialsMode::Omit => web_sys::RequestCredentials::Omit,
            CredentialsMode::SameOrigin => web_sys::RequestCredentials::SameOrigin,
            CredentialsMode::Include => web_sys::RequestCredentials::Include,
        });
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let sent = match request.body {
            Some(body) => {
                builder
                    .body(body)
                    .map_err(|e| TransportError::Network(e.to_string()))?
                    .send()
                    .await
            }
            None => builder.send().await,
        };
        let resp = sent.map_err(|e| TransportError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}
