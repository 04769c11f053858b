/// LLM Client — the single point of entry for text-improvement calls.
///
/// No other module may call the chat completions API directly.
/// One request per call: no retries, fixed 30s timeout.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

use prompts::{improve_prompt, IMPROVE_SYSTEM};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 600;
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing OpenAI API key. Set OPENAI_API_KEY in the environment.")]
    MissingApiKey,

    #[error("Failed to contact OpenAI API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected OpenAI response format: {0}")]
    UnexpectedShape(String),
}

/// Rewrites resume text. Carried in `AppState` as `Arc<dyn TextImprover>`.
#[async_trait]
pub trait TextImprover: Send + Sync {
    /// `property` names what the text is, e.g. "description".
    async fn improve(&self, text: &str, property: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat completions client used for every text-improvement call.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl LlmClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: OPENAI_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait]
impl TextImprover for LlmClient {
    async fn improve(&self, text: &str, property: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let prompt = improve_prompt(text, property);
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: IMPROVE_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .timeout(TIMEOUT)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() != 200 {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let improved = extract_content(&body)?;
        debug!(
            "Text improvement succeeded: {} chars in, {} chars out",
            text.len(),
            improved.len()
        );
        Ok(improved)
    }
}

/// Pulls `choices[0].message.content` out of a chat completions body, trimmed.
fn extract_content(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|_| LlmError::UnexpectedShape(body.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or_else(|| LlmError::UnexpectedShape(body.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::test_support::{only_request, serve_canned};

    #[test]
    fn test_extract_content_trims() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Better text.\n"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Better text.");
    }

    #[test]
    fn test_extract_content_rejects_empty_choices() {
        let err = extract_content(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LlmError::UnexpectedShape(_)));
    }

    #[test]
    fn test_extract_content_rejects_other_shapes() {
        assert!(matches!(
            extract_content(r#"{"error":{"message":"nope"}}"#),
            Err(LlmError::UnexpectedShape(_))
        ));
        assert!(matches!(
            extract_content("not json"),
            Err(LlmError::UnexpectedShape(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let client = LlmClient::new(Client::new(), None);
        let err = client.improve("text", "description").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_improve_sends_chat_request() {
        let (base, requests) = serve_canned(
            200,
            &[("content-type", "application/json")],
            r#"{"choices":[{"message":{"role":"assistant","content":" Led a team of five. "}}]}"#,
        )
        .await;
        let client = LlmClient::new(Client::new(), Some("sk-test".to_string()))
            .with_endpoint(format!("{base}/v1/chat/completions"));

        let improved = client.improve("i lead team", "description").await.unwrap();
        assert_eq!(improved, "Led a team of five.");

        let request = only_request(&requests);
        assert_eq!(request.uri.path(), "/v1/chat/completions");
        assert_eq!(request.header("authorization"), "Bearer sk-test");

        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["model"], MODEL);
        assert_eq!(body["max_tokens"], 600);
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], IMPROVE_SYSTEM);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(
            body["messages"][1]["content"],
            improve_prompt("i lead team", "description")
        );
    }

    #[tokio::test]
    async fn test_improve_non_200_carries_body() {
        let (base, _) = serve_canned(429, &[], "rate limited").await;
        let client = LlmClient::new(Client::new(), Some("sk-test".to_string()))
            .with_endpoint(format!("{base}/v1/chat/completions"));

        let err = client.improve("text", "description").await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::Api { status: 429, ref message } if message == "rate limited"
        ));
    }
}
