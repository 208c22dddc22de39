//! Wire DTOs for the portal auth endpoints.
//!
//! DESIGN
//! ======
//! Field names mirror the server payloads exactly; conversion into domain
//! types (`IdpConfig`, identity strings) happens in `net::api`.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// `GET /config` response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub oidc_authority_url: String,
    pub oidc_client_id: String,
    #[serde(default)]
    pub oidc_scope: Option<String>,
    #[serde(default)]
    pub oidc_audience: Option<String>,
}

/// `GET /users/me` response body. Extra fields are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub email: String,
}
