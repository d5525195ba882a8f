//! Delivery of encoded batches to the metrics backend.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::MetricsConfig;
use crate::error::{Result, TelemetryError};

/// `<user_id>:<api_key>` pair sent as a bearer token.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: String,
    pub api_key: String,
}

impl Credentials {
    pub fn bearer(&self) -> String {
        format!("Bearer {}:{}", self.user_id, self.api_key)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// One best-effort send of a line-protocol batch. Callers log and drop
/// errors; nothing is retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, batch: &str) -> Result<()>;
}

/// POSTs batches as `text/plain` with bearer credentials.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            credentials,
        })
    }

    pub fn from_config(cfg: &MetricsConfig) -> Result<Self> {
        Self::new(
            cfg.url.clone(),
            Credentials {
                user_id: cfg.user_id.clone(),
                api_key: cfg.api_key.clone(),
            },
            cfg.send_timeout(),
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &str) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .header(reqwest::header::AUTHORIZATION, self.credentials.bearer())
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(batch.to_owned())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TelemetryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        // Drain body for connection reuse.
        let _ = resp.bytes().await;
        Ok(())
    }
}
