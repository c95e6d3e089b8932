use async_trait::async_trait;

use super::engines::{EngineError, HttpReply};

/// Outbound GET seam for catalog queries.
///
/// Implementations return the raw status and body; status and decode checks
/// happen in the engine. Cancellation is dropping the returned future, so an
/// implementation must not keep working once it is dropped.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn get(&self, url: reqwest::Url) -> Result<HttpReply, EngineError>;
}
