//! IdP user record and profile claims.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use serde::{Deserialize, Serialize};

use crate::state::auth::AccessToken;

/// Claims consulted, in order, for the display identity.
pub const IDENTITY_CLAIMS: &[&str] = &["email", "preferred_username"];

/// Claims bag from the ID token / userinfo endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdpProfile(pub serde_json::Map<String, serde_json::Value>);

impl IdpProfile {
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(serde_json::Value::as_str)
    }

    /// First non-blank candidate claim.
    #[must_use]
    pub fn identity(&self) -> Option<String> {
        IDENTITY_CLAIMS
            .iter()
            .filter_map(|name| self.claim(name))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_owned)
    }
}

/// Authenticated user as reported by the IdP client.
///
/// Field names follow the persisted user record so the same type decodes
/// what `token_store` reads.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpUser {
    pub access_token: String,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub profile: IdpProfile,
}

impl std::fmt::Debug for IdpUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdpUser")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("identity", &self.profile.identity())
            .finish()
    }
}

impl IdpUser {
    #[must_use]
    pub fn token(&self) -> AccessToken {
        AccessToken::new(self.access_token.clone())
    }

    /// A user without `expires_at` never expires client-side.
    #[must_use]
    pub fn is_expired(&self, now_secs: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now_secs)
    }
}
