//! Location, navigation, task spawning and clock seams.
//!
//! Client-side (hydrate): backed by `window.location`,
//! `wasm_bindgen_futures::spawn_local` and `Date.now()`.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use futures::future::LocalBoxFuture;

pub trait Navigator {
    /// Path component of the current location, e.g. `/admin/users/42`.
    fn current_path(&self) -> String;
    /// Scheme + host + port, without a trailing slash.
    fn origin(&self) -> String;
    /// Replace the current location. In the browser this is a full-page load.
    fn replace(&self, path: &str);
}

/// Runs detached background work on the current thread.
pub trait TaskSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

#[cfg(feature = "hydrate")]
impl Navigator for BrowserNavigator {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| "/".to_owned())
    }

    fn origin(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default()
    }

    fn replace(&self, path: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().replace(path) {
                log::error!("location.replace({path}) failed: {e:?}");
            }
        }
    }
}

#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSpawner;

#[cfg(feature = "hydrate")]
impl TaskSpawner for BrowserSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Current time in unix seconds.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn now_unix_secs() -> i64 {
    #[cfg(feature = "hydrate")]
    {
        (js_sys::Date::now() / 1000.0) as i64
    }
    #[cfg(not(feature = "hydrate"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64)
    }
}
