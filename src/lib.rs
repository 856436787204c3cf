pub mod cycle;
pub mod dedup;
pub mod environment;
pub mod error;
pub mod item;
pub mod llm;
pub mod logging;
pub mod monitor;
pub mod prompt;
pub mod rss;
pub mod scoring;
pub mod store;

#[cfg(test)]
mod testing;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_DB: &str = "db_query";

/// Items must score strictly above this to be persisted.
pub const SCORE_THRESHOLD: u8 = 80;

#[derive(Clone, Debug)]
pub enum LLMClient {
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

#[derive(Clone, Debug)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
}
