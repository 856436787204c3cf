//! Relevance scoring boundary.
//!
//! A [`Scorer`] maps title and summary to an integer in 0-100. The cycle
//! treats any [`ScoreError`] as a score of zero.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use crate::error::ScoreError;
use crate::llm::generate_llm_response;
use crate::prompt::relevance_score_prompt;
use crate::{LLMParams, TARGET_LLM_REQUEST};

#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, title: &str, summary: &str) -> Result<u8, ScoreError>;
}

/// Scores items by asking a language model for a bare integer.
pub struct LlmScorer {
    params: LLMParams,
    topic: String,
    request_timeout: Duration,
}

impl LlmScorer {
    pub fn new(params: LLMParams, topic: impl Into<String>, request_timeout: Duration) -> Self {
        LlmScorer {
            params,
            topic: topic.into(),
            request_timeout,
        }
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(&self, title: &str, summary: &str) -> Result<u8, ScoreError> {
        let prompt = relevance_score_prompt(title, summary, &self.topic);
        let response = generate_llm_response(&prompt, &self.params, self.request_timeout).await?;
        let score = parse_score(&response)?;
        debug!(target: TARGET_LLM_REQUEST, "Scored {:?}: {}", title, score);
        Ok(score)
    }
}

/// Used when no model is configured: nothing ever qualifies.
pub struct NullScorer;

#[async_trait]
impl Scorer for NullScorer {
    async fn score(&self, _title: &str, _summary: &str) -> Result<u8, ScoreError> {
        Ok(0)
    }
}

fn think_pattern() -> &'static Regex {
    static THINK: OnceLock<Regex> = OnceLock::new();
    THINK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("static think pattern"))
}

/// Accept only a bare integer in 0-100.
///
/// Surrounding whitespace, a trailing period and a leading `<think>` block
/// from reasoning models are tolerated; any other text is rejected.
pub fn parse_score(response: &str) -> Result<u8, ScoreError> {
    let stripped = think_pattern().replace_all(response, "");
    let trimmed = stripped.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed).trim();

    let value: i64 = trimmed
        .parse()
        .map_err(|_| ScoreError::InvalidOutput(response.to_string()))?;
    if !(0..=100).contains(&value) {
        return Err(ScoreError::OutOfRange(value));
    }
    Ok(value as u8)
}
