//! Type definitions for the RSS module.

use tokio::time::Duration;

/// One feed entry mapped onto the shared schema, before date parsing.
///
/// RSS `<item>` and Atom `<entry>` both land here; missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub pub_date: Option<String>,
}

/// Per-source fetch settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Attempts per source per cycle, at least one.
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            request_timeout: REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_attempts: 1,
            retry_delay: RETRY_DELAY,
        }
    }
}

// Constants
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const RETRY_DELAY: Duration = Duration::from_secs(5);
pub const MAX_SUMMARY_CHARS: usize = 500;
pub const DEFAULT_USER_AGENT: &str = concat!("newsgate/", env!("CARGO_PKG_VERSION"));
