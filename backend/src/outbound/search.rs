//! Reqwest-backed adapter for the external full-text search service.
//!
//! The service answers `GET {endpoint}?q=<query>&limit=<n>` with
//! `{"hits": [{"postId": "...", "score": 1.5}]}`, best hit first.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::domain::ports::{SearchHit, SearchIndex, SearchIndexError};

const USER_AGENT: &str = "forum-backend-search/0.1";

#[derive(Debug, Deserialize)]
struct SearchResponseDto {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

/// Search index reached over HTTP.
pub struct HttpSearchIndex {
    client: Client,
    endpoint: Url,
}

impl HttpSearchIndex {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn perform_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchIndexError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("q", query.to_owned()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status));
        }
        parse_hits(body.as_ref(), limit)
    }
}

fn parse_hits(body: &[u8], limit: usize) -> Result<Vec<SearchHit>, SearchIndexError> {
    let decoded: SearchResponseDto = serde_json::from_slice(body)
        .map_err(|error| SearchIndexError::protocol(format!("invalid search payload: {error}")))?;
    let mut hits = decoded.hits;
    hits.truncate(limit);
    Ok(hits)
}

fn map_transport_error(error: reqwest::Error) -> SearchIndexError {
    if error.is_timeout() {
        return SearchIndexError::unavailable("search request timed out");
    }
    SearchIndexError::unavailable(error.to_string())
}

fn map_status_error(status: StatusCode) -> SearchIndexError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        SearchIndexError::unavailable(format!("search backend returned {status}"))
    } else {
        SearchIndexError::protocol(format!("search backend returned {status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostId;
    use rstest::rstest;

    #[rstest]
    fn decodes_and_truncates_hits() {
        let first = PostId::random();
        let second = PostId::random();
        let body = format!(
            r#"{{"hits":[{{"postId":"{first}","score":2.0}},{{"postId":"{second}","score":1.0}}]}}"#
        );

        let hits = parse_hits(body.as_bytes(), 1).expect("decodes");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post_id, first);
    }

    #[rstest]
    fn missing_hits_mean_no_results() {
        assert!(parse_hits(b"{}", 10).expect("decodes").is_empty());
    }

    #[rstest]
    fn malformed_payloads_are_protocol_errors() {
        let err = parse_hits(b"not json", 10).expect_err("rejected");
        assert!(matches!(err, SearchIndexError::Protocol { .. }));
    }

    #[rstest]
    #[case(StatusCode::SERVICE_UNAVAILABLE, true)]
    #[case(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case(StatusCode::BAD_REQUEST, false)]
    fn statuses_map_to_error_kinds(#[case] status: StatusCode, #[case] unavailable: bool) {
        let err = map_status_error(status);
        assert_eq!(matches!(err, SearchIndexError::Unavailable { .. }), unavailable);
    }
}
