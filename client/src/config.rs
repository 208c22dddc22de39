//! Client configuration resolved from the build stage.
//!
//! DESIGN
//! ======
//! A WASM bundle has no process environment at runtime, so the stage and the
//! optional API base override are captured with `option_env!` at build time.
//! Unknown stages fall back to `local`, matching the dev-server default.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_CALLBACK_PATH: &str = "/oidc/callback";
pub const DEFAULT_ROOT_PATH: &str = "/";

const LOCAL_API_BASE_URL: &str = "http://localhost:8000/api/app/v1";
const HOSTED_API_BASE_URL: &str = "/api/app/v1";

/// Deployment stage the bundle was built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Local,
    Dev,
    Prod,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub stage: Stage,
    /// Prefix every portal API call lives under; also the bearer-injection scope.
    pub api_base_url: String,
    pub login_path: String,
    /// Must match the redirect URI registered with the identity provider.
    pub callback_path: String,
    pub root_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_stage(Stage::Local)
    }
}

impl ClientConfig {
    #[must_use]
    pub fn for_stage(stage: Stage) -> Self {
        let api_base_url = match stage {
            Stage::Local => LOCAL_API_BASE_URL,
            Stage::Dev | Stage::Prod => HOSTED_API_BASE_URL,
        };
        Self {
            stage,
            api_base_url: api_base_url.to_owned(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            callback_path: DEFAULT_CALLBACK_PATH.to_owned(),
            root_path: DEFAULT_ROOT_PATH.to_owned(),
        }
    }

    /// Build config from `APP_STAGE` / `API_BASE_URL` captured at compile time.
    #[must_use]
    pub fn from_build_env() -> Self {
        Self::resolve(option_env!("APP_STAGE"), option_env!("API_BASE_URL"))
    }

    pub(crate) fn resolve(stage: Option<&str>, api_base_override: Option<&str>) -> Self {
        let mut config = Self::for_stage(parse_stage(stage));
        if let Some(base) = api_base_override.map(str::trim).filter(|b| !b.is_empty()) {
            config.api_base_url = base.to_owned();
        }
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_owned();
        config
    }

    /// Join `path` onto the API base, e.g. `endpoint("users/me")`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    #[must_use]
    pub fn is_callback_path(&self, path: &str) -> bool {
        path == self.callback_path
    }

    #[must_use]
    pub fn is_login_path(&self, path: &str) -> bool {
        path == self.login_path
    }
}

fn parse_stage(raw: Option<&str>) -> Stage {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "local") => Stage::Local,
        Some("dev") => Stage::Dev,
        Some("prod") => Stage::Prod,
        Some(other) => {
            log::warn!("unknown APP_STAGE '{other}', falling back to local");
            Stage::Local
        }
    }
}
