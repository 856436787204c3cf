use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::monitor::POLL_INTERVAL;
use crate::rss::{FetchConfig, DEFAULT_USER_AGENT, REQUEST_TIMEOUT};

pub const DEFAULT_FEED_URLS: &[&str] = &[
    "https://cointelegraph.com/rss",
    "https://www.coindesk.com/arc/outboundfeeds/rss/",
    "https://decrypt.co/feed",
];

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// Empty segments are dropped.
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
pub fn get_env_var_or<T: FromStr>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid value {:?} for {}", raw, var);
            default
        }),
        _ => default,
    }
}

fn get_env_string(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    None,
    Ollama { host: String, port: u16 },
    OpenAI {
        api_key: Option<String>,
        base_url: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_urls: Vec<String>,
    pub status_path: PathBuf,
    pub database_path: PathBuf,
    pub poll_interval: Duration,
    pub fetch: FetchConfig,
    pub llm_backend: LlmBackend,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout: Duration,
    pub score_topic: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let mut feed_urls = get_env_var_as_vec("FEED_URLS", ';');
        if feed_urls.is_empty() {
            feed_urls = DEFAULT_FEED_URLS.iter().map(|s| s.to_string()).collect();
        }

        let llm_backend = match get_env_string("LLM_BACKEND", "none").to_lowercase().as_str() {
            "ollama" => LlmBackend::Ollama {
                host: get_env_string("OLLAMA_HOST", "http://localhost"),
                port: get_env_var_or("OLLAMA_PORT", 11434),
            },
            "openai" => LlmBackend::OpenAI {
                api_key: env::var("OPENAI_API_KEY").ok(),
                base_url: env::var("OPENAI_BASE_URL").ok(),
            },
            "none" => LlmBackend::None,
            other => {
                warn!("Unknown LLM_BACKEND {:?}, scoring disabled", other);
                LlmBackend::None
            }
        };

        Config {
            feed_urls,
            status_path: get_env_string("STATUS_PATH", "status.json").into(),
            database_path: get_env_string("DATABASE_PATH", "database.json").into(),
            poll_interval: Duration::from_secs(get_env_var_or(
                "POLL_INTERVAL_SECS",
                POLL_INTERVAL.as_secs(),
            )),
            fetch: FetchConfig {
                request_timeout: Duration::from_secs(get_env_var_or(
                    "REQUEST_TIMEOUT_SECS",
                    REQUEST_TIMEOUT.as_secs(),
                )),
                user_agent: get_env_string("USER_AGENT", DEFAULT_USER_AGENT),
                max_attempts: get_env_var_or("FETCH_RETRIES", 1usize).max(1),
                ..FetchConfig::default()
            },
            llm_backend,
            llm_model: get_env_string("LLM_MODEL", "llama3.1"),
            llm_temperature: get_env_var_or("LLM_TEMPERATURE", 0.0),
            llm_timeout: Duration::from_secs(get_env_var_or("LLM_TIMEOUT_SECS", 60)),
            score_topic: get_env_string("SCORE_TOPIC", "Web3, cryptocurrency and blockchain"),
            log_dir: get_env_string("LOG_DIR", "logs").into(),
        }
    }
}
