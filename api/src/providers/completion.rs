use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, ProviderError, fetch_json};

const PROVIDER: &str = "completion model";
const MAX_TOKENS: u32 = 1500;
const TEMPERATURE: f32 = 0.7;

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatCompletionClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        base_url: String,
        model: String,
    ) -> Self {
        Self {
            http,
            api_key,
            base_url,
            model,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<AssistantMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Pull the first choice's text out of a response body.
fn first_content(response: ChatResponse) -> Result<String, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Payload {
            provider: PROVIDER,
            message: "response has no choices".to_string(),
        })?;

    if choice.finish_reason.as_deref() == Some("length") {
        tracing::warn!("completion stopped at the token limit; output is likely truncated");
    }

    choice
        .message
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ProviderError::Payload {
            provider: PROVIDER,
            message: "first choice has no content".to_string(),
        })
}

#[async_trait]
impl CompletionProvider for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingKey {
            provider: PROVIDER,
            env_var: "COMPLETION_API_KEY",
        })?;

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let request = self
            .http
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&body);

        let response: ChatResponse = fetch_json(PROVIDER, request).await?;
        let content = first_content(response)?;
        tracing::debug!(chars = content.len(), model = %self.model, "completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_content_returns_message_text() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"schedule\": []}"}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(response).unwrap(), r#"{"schedule": []}"#);
    }

    #[test]
    fn first_content_rejects_empty_responses() {
        let no_choices: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            first_content(no_choices),
            Err(ProviderError::Payload { .. })
        ));

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "  "}}]}"#).unwrap();
        assert!(first_content(blank).is_err());
    }

    #[test]
    fn request_body_carries_prompt_as_single_user_turn() {
        let body = ChatRequest {
            model: "m",
            messages: [ChatMessage {
                role: "user",
                content: "plan my day",
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "plan my day");
        assert_eq!(json["model"], "m");
    }
}
