//! HTTP client creation and request handling for feed sources.

use reqwest::{cookie::Jar, header};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::error::FetchError;
use crate::TARGET_WEB_REQUEST;

const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.8";

/// Create the shared client used for every feed request.
pub fn create_http_client(user_agent: &str) -> Result<reqwest::Client, FetchError> {
    let cookie_store = Jar::default();
    reqwest::Client::builder()
        .cookie_store(true)
        .cookie_provider(Arc::new(cookie_store))
        .gzip(true)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(|source| FetchError::Request {
            url: String::new(),
            source,
        })
}

/// GET a feed and return the raw body, bounded by `request_timeout`.
pub async fn fetch_feed_bytes(
    client: &reqwest::Client,
    url: &str,
    request_timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    debug!(target: TARGET_WEB_REQUEST, "Requesting {}", url);

    let request = async {
        let response = client
            .get(url)
            .header(header::ACCEPT, FEED_ACCEPT)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok::<Vec<u8>, FetchError>(bytes.to_vec())
    };

    match timeout(request_timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            timeout: request_timeout,
        }),
    }
}
