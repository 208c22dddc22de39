//! Process-lifetime cache for the IdP configuration.
//!
//! DESIGN
//! ======
//! The first caller starts one `GET /config` and stores it as a `Shared`
//! future; every later caller, including those arriving while it is still in
//! flight, awaits a clone of the same future. A failed outcome stays cached
//! ("delegated sign-in unavailable") until someone explicitly `retry`s.

#[cfg(test)]
#[path = "config_fetcher_test.rs"]
mod config_fetcher_test;

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use super::api::fetch_idp_config;
use super::transport::HttpTransport;
use crate::idp::IdpConfig;

type ConfigFuture = Shared<LocalBoxFuture<'static, Option<IdpConfig>>>;

pub struct ConfigFetcher {
    transport: Rc<dyn HttpTransport>,
    url: String,
    slot: RefCell<Option<ConfigFuture>>,
}

impl ConfigFetcher {
    #[must_use]
    pub fn new(transport: Rc<dyn HttpTransport>, url: impl Into<String>) -> Self {
        Self { transport, url: url.into(), slot: RefCell::new(None) }
    }

    /// Cached config, loading it on first use. Never fails; `None` means unavailable.
    pub async fn load(&self) -> Option<IdpConfig> {
        self.current_or_start(false).await
    }

    /// Like `load`, but re-issues the request if the cached outcome is a failure.
    pub async fn retry(&self) -> Option<IdpConfig> {
        self.current_or_start(true).await
    }

    /// Resolved config without waiting, if a successful load has finished.
    #[must_use]
    pub fn loaded(&self) -> Option<IdpConfig> {
        self.slot
            .borrow()
            .as_ref()
            .and_then(|fut| fut.peek().cloned().flatten())
    }

    fn current_or_start(&self, retry_failed: bool) -> ConfigFuture {
        let mut slot = self.slot.borrow_mut();
        if let Some(existing) = slot.as_ref() {
            let failed = matches!(existing.peek(), Some(None));
            if !(retry_failed && failed) {
                return existing.clone();
            }
            log::info!("retrying OIDC config load");
        }
        let fut = fetch_idp_config(Rc::clone(&self.transport), self.url.clone())
            .boxed_local()
            .shared();
        *slot = Some(fut.clone());
        fut
    }
}
