pub mod itunes;

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::service::CatalogTransport;
use crate::core::StoreSearchConfig;

/// Why a catalog request produced no results.
///
/// Every variant except [`EngineError::Cancelled`] collapses to the same
/// observable failure in the session; the variant is kept for logs and
/// [`crate::search::SearchSession::last_failure`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("request cancelled")]
    Cancelled,
    #[error("transport: {0}")]
    Transport(String),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// The HTTP client gave up on its own timer (connect or read).
    #[error("client timeout: {0}")]
    ClientTimeout(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("decode: {0}")]
    Decode(String),
}

impl EngineError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }

    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Cancelled => "cancelled",
            EngineError::Transport(_) => "transport",
            EngineError::Timeout(_) | EngineError::ClientTimeout(_) => "timeout",
            EngineError::Status { .. } => "status",
            EngineError::Decode(_) => "decode",
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EngineError::ClientTimeout(e.to_string())
        } else if e.is_connect() {
            EngineError::Transport(format!("connect: {}", e))
        } else {
            EngineError::Transport(e.to_string())
        }
    }
}

/// Raw response as seen by the engine, before any status or decode checks.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }
}

const BODY_PREVIEW_CHARS: usize = 200;

/// First few hundred characters of a body, for error messages.
pub fn body_preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
    out.push('…');
    out
}

/// `reqwest`-backed transport used outside tests.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds the client from config. The whole-request timeout is enforced by
    /// the session, so only the connect timeout is set here.
    pub fn from_config(cfg: &StoreSearchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.resolve_connect_timeout())
            .user_agent(cfg.resolve_user_agent())
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn get(&self, url: reqwest::Url) -> Result<HttpReply, EngineError> {
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cancelled_is_cancellation() {
        assert!(EngineError::Cancelled.is_cancellation());
        assert!(!EngineError::Transport("refused".into()).is_cancellation());
        assert!(!EngineError::Timeout(Duration::from_secs(1)).is_cancellation());
        assert!(!EngineError::Decode("eof".into()).is_cancellation());
    }

    #[test]
    fn timeout_message_uses_millis() {
        let e = EngineError::Timeout(Duration::from_millis(1500));
        assert_eq!(e.to_string(), "timed out after 1500ms");
        assert_eq!(e.kind(), "timeout");
    }

    #[tokio::test]
    async fn client_timeout_is_classified_as_timeout() {
        // Accepts the connection and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((sock, _)) = listener.accept().await {
                held.push(sock);
            }
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let transport = HttpTransport::new(client);
        let url = reqwest::Url::parse(&format!("http://{}/search", addr)).unwrap();

        let err = transport.get(url).await.unwrap_err();
        assert!(matches!(err, EngineError::ClientTimeout(_)), "{err:?}");
        assert_eq!(err.kind(), "timeout");
        assert!(!err.is_cancellation());
    }

    #[test]
    fn body_preview_truncates_long_bodies() {
        let long = "x".repeat(500);
        let preview = body_preview(&long);
        assert_eq!(preview.chars().count(), BODY_PREVIEW_CHARS + 1);
        assert!(preview.ends_with('…'));
        assert_eq!(body_preview("  short  "), "short");
    }
}
