//! Upstox REST adapter configuration

use services_common::constants::vendor;

/// Upstox v2 REST configuration
#[derive(Debug, Clone)]
pub struct UpstoxApiConfig {
    /// API base URL
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstoxApiConfig {
    fn default() -> Self {
        Self {
            base_url: vendor::BASE_URL.to_string(),
            timeout_secs: 15,
        }
    }
}

impl UpstoxApiConfig {
    /// Override the base URL (tests point this at a mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}
