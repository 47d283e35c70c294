//! OpenAI Chat Completions caller.
//!
//! Assembles the retrieved context chunks and the task prompt into a
//! single chat request and returns the model's text answer. The call is
//! fail-fast from the pipeline's point of view: transient errors (rate
//! limits, server errors, network failures) are retried with exponential
//! backoff, anything else is an immediate error, and the caller never
//! fabricates a result for a failed call.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::ModelConfig;
use crate::models::Retrieved;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Sampling temperature for all check calls.
const TEMPERATURE: f64 = 0.2;

/// Label the retrieved chunks for citation and join them into one block.
///
/// Positions are 1-based so the model can refer to "[CONTEXT #2]" and a
/// reader can map that back to the ranked excerpt list.
pub fn build_context_text(context: &[Retrieved]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[CONTEXT #{}]\n{}", i + 1, hit.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Build the user message: grounding instructions, context block, task.
fn build_user_message(task_prompt: &str, context: &[Retrieved]) -> String {
    format!(
        "次のコンテキスト（申請書の抜粋）に基づいてタスクを実施してください。\n\
         【重要】コンテキスト外の情報で断定せず、不明点は『不明』と記載。\n\n\
         {}\n\n\
         ----\n\
         【タスク】\n{}",
        build_context_text(context),
        task_prompt
    )
}

/// Resolve the model name: explicit override, then `OPENAI_MODEL`, then
/// the configured default.
pub fn resolve_model(config: &ModelConfig, model_override: Option<&str>) -> String {
    if let Some(m) = model_override {
        return m.to_string();
    }
    std::env::var("OPENAI_MODEL").unwrap_or_else(|_| config.name.clone())
}

/// Call the chat API with the task prompt and retrieved context.
///
/// Requires `OPENAI_API_KEY` in the environment. Returns the assistant's
/// text, or an error after retries are exhausted.
pub async fn call_with_context(
    config: &ModelConfig,
    system_prompt: &str,
    task_prompt: &str,
    context: &[Retrieved],
    model_override: Option<&str>,
) -> Result<String> {
    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

    let model = resolve_model(config, model_override);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": build_user_message(task_prompt, context) },
        ],
        "temperature": TEMPERATURE,
    });

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_chat_response(&json);
                }

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!(
                        "OpenAI API error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }

                // Client error (not 429) — don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("OpenAI API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Model call failed after retries")))
}

/// Pull the assistant message text out of a chat completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing choices[0].message.content"))
}
