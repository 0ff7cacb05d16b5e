//! REST client for the platform gateway.
//!
//! Endpoints used:
//!
//! | Method | Path                                     | Body / query        |
//! |--------|------------------------------------------|---------------------|
//! | POST   | `/direct-messages`                       | `{recipient, text}` |
//! | GET    | `/users/{account}/{followers,following}` | `?limit=N`          |
//!
//! Path segments are percent-encoded, so an account name can never address
//! a different endpoint.
//!
//! Error bodies are expected as `{"message": "..."}`; anything else is
//! reported verbatim.

use std::time::Duration;

use async_trait::async_trait;
use herald_core::extraction::ExtractionKind;
use herald_core::outcome::SendOutcome;
use herald_dispatch::{MessageSender, RecipientSource, SourceError};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// HTTP client for one gateway instance.
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    recipient: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    users: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GatewayClient {
    /// Build a client with its own connection pool and request timeout.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        }
    }

    /// `POST /direct-messages`.
    pub async fn post_direct_message(
        &self,
        recipient: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        let response = self
            .authorized(self.client.post(self.endpoint(&["direct-messages"])?))
            .json(&SendRequest { recipient, text })
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    /// `GET /users/{account}/{kind}?limit={limit}`.
    pub async fn get_related_users(
        &self,
        account: &str,
        kind: ExtractionKind,
        limit: usize,
    ) -> Result<Vec<String>, GatewayError> {
        let url = self.endpoint(&["users", account, kind.as_str()])?;
        let response = self
            .authorized(self.client.get(url))
            .query(&[("limit", limit)])
            .send()
            .await?;

        let body: UsersResponse = Self::ensure_success(response).await?.json().await?;
        Ok(body.users)
    }

    // ---- private helpers ----

    /// `base_url` with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let invalid = || GatewayError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Return the response unchanged on 2xx, otherwise a
    /// [`GatewayError::Api`] carrying the gateway's message.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Map a failed send onto the outcome taxonomy.
fn classify_send_error(err: GatewayError) -> SendOutcome {
    let reason = err.reason();
    match err.status().and_then(|s| StatusCode::from_u16(s).ok()) {
        Some(StatusCode::UNAUTHORIZED) => SendOutcome::SessionLost { reason },
        Some(StatusCode::FORBIDDEN | StatusCode::NOT_FOUND) => {
            SendOutcome::RecipientUnreachable { reason }
        }
        Some(StatusCode::TOO_MANY_REQUESTS) => SendOutcome::RateLimited { reason },
        _ => SendOutcome::TransportError { reason },
    }
}

#[async_trait]
impl MessageSender for GatewayClient {
    async fn send(&self, recipient: &str, message: &str) -> SendOutcome {
        match self.post_direct_message(recipient, message).await {
            Ok(()) => SendOutcome::Delivered,
            Err(err) => {
                tracing::debug!(%recipient, error = %err, "Gateway send failed");
                classify_send_error(err)
            }
        }
    }
}

#[async_trait]
impl RecipientSource for GatewayClient {
    async fn fetch(
        &self,
        target: &str,
        kind: ExtractionKind,
        max_count: usize,
    ) -> Result<Vec<String>, SourceError> {
        self.get_related_users(target, kind, max_count)
            .await
            .map_err(|err| match err.status() {
                Some(401) => SourceError::SessionLost(err.reason()),
                Some(404) => SourceError::NotFound(target.to_string()),
                _ => SourceError::Upstream(err.to_string()),
            })
    }
}
