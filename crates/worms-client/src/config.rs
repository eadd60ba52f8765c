//! Client configuration for the WoRMS API

use std::env;
use std::time::Duration;

/// Public WoRMS REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.marinespecies.org/rest";
const DEFAULT_USER_AGENT: &str = concat!("worms-client-rs/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration
#[derive(Debug, Clone)]
pub struct WormsConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl WormsConfig {
    /// Defaults, with the base URL overridable through `WORMS_BASE_URL`
    pub fn from_env() -> Self {
        let base_url = env::var("WORMS_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self::default().base_url(&base_url)
    }

    /// Replace the base URL; a trailing slash is dropped
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

impl Default for WormsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
