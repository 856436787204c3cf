use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::error::ScoreError;
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

const MAX_RETRIES: u32 = 2;

/// Send `prompt` to the configured model, retrying with exponential backoff.
pub async fn generate_llm_response(
    prompt: &str,
    params: &LLMParams,
    request_timeout: Duration,
) -> Result<String, ScoreError> {
    let mut backoff = 2;
    let mut last_err = ScoreError::Request("no attempt made".to_string());

    debug!(target: TARGET_LLM_REQUEST, "Starting LLM request for prompt: {}", prompt);

    for retry_count in 0..MAX_RETRIES {
        match timeout(request_timeout, send_request(prompt, params)).await {
            Ok(Ok(response)) => {
                debug!(target: TARGET_LLM_REQUEST, "LLM response received: {}", response);
                return Ok(response);
            }
            Ok(Err(e)) => {
                warn!(target: TARGET_LLM_REQUEST, "Error generating response: {}", e);
                last_err = e;
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM request timed out");
                last_err = ScoreError::Timeout(request_timeout);
            }
        }

        if retry_count < MAX_RETRIES - 1 {
            info!(target: TARGET_LLM_REQUEST, "Retrying LLM request in {} seconds ({}/{})", backoff, retry_count + 1, MAX_RETRIES);
            sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }

    error!(target: TARGET_LLM_REQUEST, "Failed to generate response after {} attempts", MAX_RETRIES);
    Err(last_err)
}

async fn send_request(prompt: &str, params: &LLMParams) -> Result<String, ScoreError> {
    match &params.llm_client {
        LLMClient::Ollama(ollama) => {
            let request = GenerationRequest::new(params.model.clone(), prompt.to_string())
                .options(GenerationOptions::default().temperature(params.temperature));
            ollama
                .generate(request)
                .await
                .map(|response| response.response)
                .map_err(|e| ScoreError::Request(e.to_string()))
        }
        LLMClient::OpenAI(client) => {
            let messages: Vec<ChatCompletionRequestMessage> =
                vec![ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| ScoreError::Request(e.to_string()))?
                    .into()];
            let request = CreateChatCompletionRequestArgs::default()
                .model(params.model.clone())
                .temperature(params.temperature)
                .messages(messages)
                .build()
                .map_err(|e| ScoreError::Request(e.to_string()))?;

            let response = client
                .chat()
                .create(request)
                .await
                .map_err(|e| ScoreError::Request(e.to_string()))?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| ScoreError::InvalidOutput(String::new()))
        }
    }
}
