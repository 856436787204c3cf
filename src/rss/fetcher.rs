//! Per-source fetching with freshness filtering.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::client::{create_http_client, fetch_feed_bytes};
use super::parser::parse_feed;
use super::types::{FeedEntry, FetchConfig};
use super::util::{is_valid_url, parse_date};
use crate::error::FetchError;
use crate::item::Item;
use crate::TARGET_WEB_REQUEST;

/// Anything that can turn a source URL into fresh items.
///
/// Implementations never fail: a broken source contributes nothing.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str, cutoff: DateTime<Utc>) -> Vec<Item>;
}

pub struct FeedFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl FeedFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = create_http_client(&config.user_agent)?;
        Ok(FeedFetcher { client, config })
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match fetch_feed_bytes(&self.client, url, self.config.request_timeout).await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < attempts => {
                    warn!(target: TARGET_WEB_REQUEST, "Attempt {}/{} failed: {}; retrying in {:?}", attempt, attempts, err, self.config.retry_delay);
                    attempt += 1;
                    sleep(self.config.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, url: &str, cutoff: DateTime<Utc>) -> Vec<Item> {
        if url.trim().is_empty() {
            debug!(target: TARGET_WEB_REQUEST, "Skipping empty feed URL");
            return Vec::new();
        }
        if !is_valid_url(url) {
            warn!(target: TARGET_WEB_REQUEST, "{}", FetchError::InvalidUrl(url.to_string()));
            return Vec::new();
        }

        let body = match self.fetch_with_retries(url).await {
            Ok(body) => body,
            Err(err) => {
                warn!(target: TARGET_WEB_REQUEST, "Skipping source: {}", err);
                return Vec::new();
            }
        };

        let entries = parse_feed(&body);
        let parsed = entries.len();
        let items = filter_fresh(entries, cutoff, url);
        info!(target: TARGET_WEB_REQUEST, "Fetched {}: {} entries, {} newer than {}", url, parsed, items.len(), cutoff.to_rfc3339());
        items
    }
}

/// Keep entries with a parseable date strictly after `cutoff`.
///
/// An entry without a usable date is dropped since its freshness can't be shown.
pub fn filter_fresh(entries: Vec<FeedEntry>, cutoff: DateTime<Utc>, source: &str) -> Vec<Item> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let published_at = match entry.pub_date.as_deref().and_then(parse_date) {
                Some(date) => date,
                None => {
                    debug!(target: TARGET_WEB_REQUEST, "Dropping undated entry: {}", entry.title);
                    return None;
                }
            };
            if published_at <= cutoff {
                return None;
            }
            Some(Item {
                title: entry.title,
                link: entry.link,
                summary: entry.summary,
                published_at,
                source: source.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(title: &str, pub_date: Option<&str>) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: format!("https://example.com/{}", title),
            summary: String::new(),
            pub_date: pub_date.map(str::to_string),
        }
    }

    fn test_config() -> FetchConfig {
        FetchConfig {
            request_timeout: Duration::from_secs(2),
            user_agent: "newsgate-test".to_string(),
            max_attempts: 1,
            retry_delay: Duration::from_millis(0),
        }
    }

    fn rss_with_dates(dates: &[(&str, &str)]) -> String {
        let items: String = dates
            .iter()
            .map(|(title, date)| {
                format!(
                    "<item><title>{t}</title><link>https://news.example.com/{t}</link><pubDate>{d}</pubDate></item>",
                    t = title,
                    d = date
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>x</title>{}</channel></rss>"#,
            items
        )
    }

    #[test]
    fn test_cutoff_is_strict() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let entries = vec![
            entry("at", Some("2024-05-01T12:00:00Z")),
            entry("before", Some("2024-05-01T11:59:59Z")),
            entry("after", Some("2024-05-01T12:00:01Z")),
        ];
        let items = filter_fresh(entries, cutoff, "src");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "after");
        assert_eq!(items[0].source, "src");
    }

    #[test]
    fn test_undated_entries_dropped() {
        let cutoff = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let entries = vec![
            entry("missing", None),
            entry("garbage", Some("sometime last week")),
            entry("naive", Some("2024-05-01 08:00:00")),
        ];
        let items = filter_fresh(entries, cutoff, "src");
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].published_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_fetch_filters_and_sends_user_agent() {
        let server = MockServer::start().await;
        let now = Utc::now();
        let fresh = (now - ChronoDuration::hours(1)).to_rfc2822();
        let stale = (now - ChronoDuration::hours(30)).to_rfc2822();
        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(header("user-agent", "newsgate-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(rss_with_dates(&[("fresh", fresh.as_str()), ("stale", stale.as_str())])),
            )
            .mount(&server)
            .await;

        let fetcher = FeedFetcher::new(test_config()).unwrap();
        let url = format!("{}/feed", server.uri());
        let items = fetcher.fetch(&url, now - ChronoDuration::hours(24)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "fresh");
        assert_eq!(items[0].source, url);
    }

    #[tokio::test]
    async fn test_http_error_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = FeedFetcher::new(test_config()).unwrap();
        let items = fetcher
            .fetch(&format!("{}/feed", server.uri()), Utc::now())
            .await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(rss_with_dates(&[]))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let mut config = test_config();
        config.request_timeout = Duration::from_millis(200);
        let fetcher = FeedFetcher::new(config).unwrap();
        let items = fetcher
            .fetch(&format!("{}/feed", server.uri()), Utc::now())
            .await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let server = MockServer::start().await;
        let published = (Utc::now() - ChronoDuration::minutes(5)).to_rfc2822();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(rss_with_dates(&[("late", published.as_str())])),
            )
            .mount(&server)
            .await;

        let mut config = test_config();
        config.max_attempts = 2;
        let fetcher = FeedFetcher::new(config).unwrap();
        let items = fetcher
            .fetch(
                &format!("{}/feed", server.uri()),
                Utc::now() - ChronoDuration::hours(1),
            )
            .await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_urls_skipped() {
        let fetcher = FeedFetcher::new(test_config()).unwrap();
        assert!(fetcher.fetch("", Utc::now()).await.is_empty());
        assert!(fetcher.fetch("file:///etc/passwd", Utc::now()).await.is_empty());
    }
}
