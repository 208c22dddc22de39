//! Typed accessor for the IdP client's persisted user record.
//!
//! The record is owned by the IdP client; the bridge only reads it, under a
//! key derived from authority and client id. Storage is never enumerated.

#[cfg(test)]
#[path = "token_store_test.rs"]
mod token_store_test;

use super::{IdpSettings, IdpUser};
use crate::util::storage::{KeyValueStore, load_json};

/// Key the IdP client uses for its user record.
#[must_use]
pub fn user_storage_key(authority: &str, client_id: &str) -> String {
    format!("oidc.user:{authority}:{client_id}")
}

/// Read the persisted user for these settings, if any.
pub fn load_stored_user(store: &dyn KeyValueStore, settings: &IdpSettings) -> Option<IdpUser> {
    load_json(store, &user_storage_key(&settings.authority, &settings.client_id))
}
