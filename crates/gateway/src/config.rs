/// Gateway connection settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway, without a trailing slash.
    pub base_url: String,
    /// Bearer token for the gateway, if it requires one.
    pub token: Option<String>,
    /// Per-request timeout in seconds (default: `30`).
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `GATEWAY_URL`          | `http://localhost:8090` |
    /// | `GATEWAY_TOKEN`        | unset                   |
    /// | `GATEWAY_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Self {
        let base_url = std::env::var("GATEWAY_URL")
            .unwrap_or_else(|_| "http://localhost:8090".into())
            .trim_end_matches('/')
            .to_string();

        let token = std::env::var("GATEWAY_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let timeout_secs: u64 = std::env::var("GATEWAY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("GATEWAY_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            token,
            timeout_secs,
        }
    }

    /// Config pointing at `base_url` with no token and the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}
