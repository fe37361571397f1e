use std::time::Duration;

use usermirror_core::{env_lookup, parse_flag, parse_var, SyncError};

const DEFAULT_HOST: &str = "localhost";
/// Qdrant's gRPC port; the REST port (6333) is not used by this client.
const DEFAULT_PORT: u16 = 6334;

/// Configuration for connecting to a Qdrant instance.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Qdrant gRPC URL (e.g. `http://localhost:6334`).
    pub url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Per-request timeout. `None` keeps the client default.
    pub timeout: Option<Duration>,
}

impl QdrantConfig {
    /// Create a new config pointing at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: None,
        }
    }

    /// Build the URL from host, port and transport security flag.
    pub fn from_host(host: &str, port: u16, https: bool) -> Self {
        let scheme = if https { "https" } else { "http" };
        Self::new(format!("{scheme}://{host}:{port}"))
    }

    /// Load from `QDRANT_HOST`, `QDRANT_PORT`, `QDRANT_HTTPS`, `QDRANT_API_KEY`
    /// and `QDRANT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(env_lookup)
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        let host = lookup("QDRANT_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_var(&lookup, "QDRANT_PORT")?.unwrap_or(DEFAULT_PORT);
        let https = parse_flag(&lookup, "QDRANT_HTTPS")?.unwrap_or(false);

        let mut config = Self::from_host(&host, port, https);
        if let Some(api_key) = lookup("QDRANT_API_KEY") {
            config = config.with_api_key(api_key);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "QDRANT_TIMEOUT_SECS")? {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Set the API key for authenticated access.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
