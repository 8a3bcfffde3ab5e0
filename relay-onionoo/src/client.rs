//! Onionoo HTTP client
//!
//! Builds the HTTP client used for the details fetch.

use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;

/// Running relays only; bridges come along in the same document
pub const DEFAULT_API_URL: &str =
    "https://onionoo.torproject.org/details?search=type:relay%20running:true";

/// Fetch configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Details endpoint URL
    pub api_url: String,
    /// Optional proxy, e.g. `socks5h://127.0.0.1:9050` to fetch over Tor
    pub proxy: Option<String>,
    /// Request timeout in seconds (None = wait indefinitely)
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            proxy: None,
            timeout_secs: None,
            user_agent: concat!("relay-dataset/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn with_proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_string());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Errors from the details fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Onionoo returned status {0}")]
    Status(u16),

    #[error("Invalid details document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Onionoo returned an empty document")]
    EmptyPayload,
}

/// Create the HTTP client for a fetch
pub fn create_client(config: &FetchConfig) -> Result<Client, FetchError> {
    let mut builder = Client::builder().user_agent(config.user_agent.as_str());

    if let Some(addr) = &config.proxy {
        let proxy = Proxy::all(addr).map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder
        .build()
        .map_err(|e| FetchError::ClientBuild(e.to_string()))
}
