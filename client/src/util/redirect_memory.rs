//! Post-login destination that survives the IdP redirect round-trip.
//!
//! SYSTEM CONTEXT
//! ==============
//! An auth gate (or the login page) calls `remember` with the page the user
//! was trying to reach; the bridge calls `consume` once, right after identity
//! goes from absent to present. The entry lives in session storage so a
//! full-page redirect through the IdP does not lose it.

#[cfg(test)]
#[path = "redirect_memory_test.rs"]
mod redirect_memory_test;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::storage::{KeyValueStore, load_json, save_json};

pub const REDIRECT_KEY: &str = "postLoginRedirect";

/// True for a same-origin absolute path. Browsers read `//host` and `/\host`
/// as scheme-relative URLs, so a second `/` or `\` is rejected, as are
/// control characters.
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(char::is_control)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct RedirectIntent {
    target_path: String,
}

#[derive(Clone)]
pub struct RedirectMemory {
    store: Rc<dyn KeyValueStore>,
    callback_path: String,
    root_path: String,
}

impl RedirectMemory {
    #[must_use]
    pub fn new(store: Rc<dyn KeyValueStore>, callback_path: impl Into<String>, root_path: impl Into<String>) -> Self {
        Self { store, callback_path: callback_path.into(), root_path: root_path.into() }
    }

    /// Store `path` as the destination. Blank, off-site and callback paths
    /// are ignored.
    pub fn remember(&self, path: &str) {
        let path = path.trim();
        if !is_local_path(path) || self.is_callback(path) {
            return;
        }
        save_json(self.store.as_ref(), REDIRECT_KEY, &RedirectIntent { target_path: path.to_owned() });
    }

    /// Remove and return the stored destination.
    pub fn consume(&self) -> Option<String> {
        let intent: Option<RedirectIntent> = load_json(self.store.as_ref(), REDIRECT_KEY);
        self.store.remove(REDIRECT_KEY);
        intent
            .map(|i| i.target_path)
            .filter(|p| is_local_path(p) && !self.is_callback(p))
    }

    /// `consume`, falling back to the application root.
    pub fn take_destination(&self) -> String {
        self.consume().unwrap_or_else(|| self.root_path.clone())
    }

    fn is_callback(&self, path: &str) -> bool {
        path.split(['?', '#']).next() == Some(self.callback_path.as_str())
    }
}
