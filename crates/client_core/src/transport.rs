use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{CommandEnvelope, Endpoint, ResponseEnvelope};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("server answered HTTP {0}")]
    Status(u16),
}

/// One POST per command. Implementations must not retry: the server does
/// not guarantee that commands are idempotent.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn post(
        &self,
        endpoint: Endpoint,
        envelope: &CommandEnvelope,
    ) -> Result<ResponseEnvelope, TransportError>;
}

pub struct HttpTransport {
    http: Client,
    server_url: String,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        Self::with_timeout(server_url, None)
    }

    pub fn with_timeout(
        server_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let server_url = normalize_server_url(server_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            server_url,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

pub(crate) fn normalize_server_url(raw: &str) -> Result<String, TransportError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(TransportError::InvalidUrl {
            url: raw.to_string(),
            reason: "server_url must start with http:// or https://".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl CommandTransport for HttpTransport {
    async fn post(
        &self,
        endpoint: Endpoint,
        envelope: &CommandEnvelope,
    ) -> Result<ResponseEnvelope, TransportError> {
        let response = self
            .http
            .post(format!("{}{}", self.server_url, endpoint.route()))
            .json(envelope)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
