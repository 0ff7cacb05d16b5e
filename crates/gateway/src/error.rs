/// Errors from the gateway HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Gateway error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `message` field of the error body, or the raw body text.
        message: String,
    },

    /// The configured base URL cannot carry path segments.
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Request(err) => err.status().map(|s| s.as_u16()),
            GatewayError::Api { status, .. } => Some(*status),
            GatewayError::InvalidUrl(_) => None,
        }
    }

    /// Human-readable reason without the status prefix.
    pub fn reason(&self) -> String {
        match self {
            GatewayError::Request(err) => err.to_string(),
            GatewayError::Api { message, .. } => message.clone(),
            GatewayError::InvalidUrl(url) => format!("invalid gateway URL {url}"),
        }
    }
}
