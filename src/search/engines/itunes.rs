use crate::search::service::CatalogTransport;
use crate::types::{sort_results, CatalogResponse, Category, SearchResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use super::{body_preview, EngineError};

/// Upper bound on records requested per query.
pub const RESULT_LIMIT: u32 = 200;

/// Everything except RFC 3986 unreserved characters, so `&`, `=`, `+` and
/// spaces in the term cannot leak into the query structure.
const TERM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Builds `endpoint?term=<text>&limit=200[&entity=<keyword>]`.
///
/// Any query string already present on `endpoint` is replaced.
pub fn build_search_url(endpoint: &Url, text: &str, category: Category) -> Url {
    let mut query = format!(
        "term={}&limit={}",
        utf8_percent_encode(text, TERM_ENCODE_SET),
        RESULT_LIMIT
    );
    let entity = category.entity_keyword();
    if !entity.is_empty() {
        query.push_str("&entity=");
        query.push_str(entity);
    }

    let mut url = endpoint.clone();
    url.set_query(Some(&query));
    url
}

/// Decodes a `{ "results": [...] }` body. One bad record fails the whole batch.
pub fn parse_results(body: &str) -> Result<Vec<SearchResult>, EngineError> {
    let envelope: CatalogResponse =
        serde_json::from_str(body).map_err(|e| EngineError::Decode(e.to_string()))?;
    Ok(envelope.results.into_iter().map(SearchResult::from).collect())
}

/// Runs one query: fetch, require `200 OK`, decode, sort.
pub async fn search(
    transport: &dyn CatalogTransport,
    url: Url,
    timeout: Option<Duration>,
) -> Result<Vec<SearchResult>, EngineError> {
    let reply = match timeout {
        Some(limit) => tokio::time::timeout(limit, transport.get(url))
            .await
            .map_err(|_| EngineError::Timeout(limit))??,
        None => transport.get(url).await?,
    };

    if reply.status != StatusCode::OK {
        return Err(EngineError::Status {
            status: reply.status,
            body: body_preview(&reply.body),
        });
    }

    let mut results = parse_results(&reply.body)?;
    sort_results(&mut results);
    debug!("catalog returned {} results", results.len());
    Ok(results)
}
