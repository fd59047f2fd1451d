//! Minimal client for OpenAI-compatible chat-completion APIs (Groq by default).

use crate::config::Llm;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const ENDPOINT_CHAT: &str = "/chat/completions";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{0} not found in environment variables")]
    MissingApiKey(String),
    #[error("chat completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat completion request failed: {status} {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("no content received from chat completion API")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct ChatClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(client: reqwest::Client, settings: &Llm, api_key: String) -> Self {
        Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            timeout: settings.timeout(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one chat completion and return the first choice's content.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let url = format!("{}{ENDPOINT_CHAT}", self.api_url);
        debug!(model = %request.model, "calling chat completions");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "chat completion API error");
            return Err(LlmError::Status { status, body });
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(api_url: &str) -> Llm {
        Llm {
            api_url: api_url.to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key_env: "PORTFOLIO_TEST_UNSET_KEY".to_string(),
            timeout_secs: 5,
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new(
            "llama3-8b-8192",
            vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
        )
        .with_temperature(0.3)
        .with_max_tokens(150)
    }

    #[test]
    fn test_request_serializes_openai_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 150);
        let bare = serde_json::to_value(ChatRequest::new("m", vec![])).unwrap();
        assert!(bare.get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "llama3-8b-8192"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Solid month."}}]
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(
            reqwest::Client::new(),
            &settings(&server.uri()),
            "test-key".to_string(),
        );
        assert_eq!(client.complete(&request()).await.unwrap(), "Solid month.");
    }

    #[tokio::test]
    async fn test_complete_surfaces_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = ChatClient::new(
            reqwest::Client::new(),
            &settings(&server.uri()),
            "k".to_string(),
        );
        match client.complete(&request()).await {
            Err(LlmError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(
            reqwest::Client::new(),
            &settings(&server.uri()),
            "k".to_string(),
        );
        assert!(matches!(
            client.complete(&request()).await,
            Err(LlmError::EmptyContent)
        ));
    }
}
