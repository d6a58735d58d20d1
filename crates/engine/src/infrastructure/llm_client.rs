//! Text backend client.
//!
//! Speaks either the OpenAI chat-completions protocol (bearer credential) or
//! Ollama's native `/api/generate` endpoint, chosen by [`TextProvider`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::infrastructure::config::{TextBackendConfig, TextProvider};
use crate::infrastructure::ports::{
    LlmError, LlmPort, LlmRequest, LlmResponse, MessageRole, TokenUsage,
};

/// Client for a configured text-completion backend
#[derive(Clone)]
pub struct HttpLlmClient {
    client: Client,
    provider: TextProvider,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpLlmClient {
    pub fn new(config: &TextBackendConfig) -> Self {
        // Use 120 second timeout for LLM requests (they can be slow)
        Self::with_timeout(config, 120)
    }

    /// Create client with custom timeout (for testing).
    pub fn with_timeout(config: &TextBackendConfig, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            provider: config.provider,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.trim().to_string(),
        }
    }

    fn ensure_configured(&self) -> Result<(), LlmError> {
        if self.base_url.is_empty() {
            return Err(LlmError::NotConfigured);
        }
        if self.provider == TextProvider::OpenAi && self.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }
        Ok(())
    }

    async fn generate_openai(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let api_request = OpenAIChatRequest {
            model: self.model.clone(),
            messages: build_messages(&request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let api_response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(convert_chat_response(api_response))
    }

    async fn generate_ollama(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let api_request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: flatten_prompt(&request),
            system: request.system_prompt.clone(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let api_response: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(convert_ollama_response(api_response))
    }
}

#[async_trait]
impl LlmPort for HttpLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.ensure_configured()?;
        match self.provider {
            TextProvider::OpenAi => self.generate_openai(request).await,
            TextProvider::Ollama => self.generate_ollama(request).await,
        }
    }
}

fn build_messages(request: &LlmRequest) -> Vec<OpenAIMessage> {
    let mut messages = Vec::new();

    if let Some(system) = &request.system_prompt {
        messages.push(OpenAIMessage {
            role: "system".to_string(),
            content: Some(system.clone()),
        });
    }

    for msg in &request.messages {
        messages.push(OpenAIMessage {
            role: role_name(msg.role).to_string(),
            content: Some(msg.content.clone()),
        });
    }

    messages
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    }
}

/// `/api/generate` takes one prompt; non-user turns are prefixed with their role.
fn flatten_prompt(request: &LlmRequest) -> String {
    request
        .messages
        .iter()
        .map(|msg| match msg.role {
            MessageRole::User => msg.content.clone(),
            other => format!("{}: {}", role_name(other), msg.content),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A response without choices or content is an empty completion, not an error.
fn convert_chat_response(response: OpenAIChatResponse) -> LlmResponse {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    LlmResponse {
        content,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    }
}

/// Usage is reported only when both counters are present.
fn convert_ollama_response(response: OllamaGenerateResponse) -> LlmResponse {
    LlmResponse {
        content: response.response.unwrap_or_default(),
        usage: match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt.saturating_add(completion),
            }),
            _ => None,
        },
    }
}

/// Turn a non-success response into [`LlmError::Status`], keeping the body
/// for the log and any `Retry-After` hint for the retry layer.
async fn status_error(response: Response) -> LlmError {
    let status = response.status().as_u16();
    let retry_after = retry_after_seconds(response.headers());
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
    LlmError::Status {
        status,
        body,
        retry_after,
    }
}

/// Only the delta-seconds form is understood; HTTP dates are ignored.
fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

// =============================================================================
// OpenAI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAIChoice {
    #[serde(default)]
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// =============================================================================
// Ollama API types
// =============================================================================

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::ChatMessage;

    fn openai_config(api_key: &str) -> TextBackendConfig {
        TextBackendConfig {
            provider: TextProvider::OpenAi,
            base_url: "https://api.openai.com/".to_string(),
            model: "gpt-4".to_string(),
            api_key: api_key.to_string(),
            max_retries: 0,
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = HttpLlmClient::new(&openai_config("  "));
        let result = client
            .generate(LlmRequest::new(vec![ChatMessage::user("hello")]))
            .await;
        assert!(matches!(result, Err(LlmError::NotConfigured)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpLlmClient::new(&openai_config("sk-test"));
        assert_eq!(client.base_url, "https://api.openai.com");
    }

    #[test]
    fn test_system_prompt_leads_messages() {
        let request = LlmRequest::new(vec![ChatMessage::user("a ring")])
            .with_system_prompt("Output JSON.");
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content.as_deref(), Some("a ring"));
    }

    #[test]
    fn test_chat_response_without_content_is_empty() {
        let body = r#"{"choices":[{"message":{"role":"assistant"}}]}"#;
        let parsed: OpenAIChatResponse = serde_json::from_str(body).expect("valid body");
        assert_eq!(convert_chat_response(parsed).content, "");

        let no_choices: OpenAIChatResponse =
            serde_json::from_str(r#"{"choices":[]}"#).expect("valid body");
        assert_eq!(convert_chat_response(no_choices).content, "");
    }

    #[test]
    fn test_chat_response_content_extracted() {
        let body = r#"{
            "choices":[{"message":{"role":"assistant","content":"Frostbrand"}}],
            "usage":{"prompt_tokens":10,"completion_tokens":2,"total_tokens":12}
        }"#;
        let parsed: OpenAIChatResponse = serde_json::from_str(body).expect("valid body");
        let response = convert_chat_response(parsed);
        assert_eq!(response.content, "Frostbrand");
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(12));
    }

    #[test]
    fn test_ollama_response_extracted() {
        let body = r#"{"model":"llama3","response":"Ember Ring","done":true,
            "prompt_eval_count":40,"eval_count":5}"#;
        let parsed: OllamaGenerateResponse = serde_json::from_str(body).expect("valid body");
        let response = convert_ollama_response(parsed);
        assert_eq!(response.content, "Ember Ring");
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(45));
    }

    #[test]
    fn test_ollama_response_without_text_is_empty() {
        for body in [r#"{}"#, r#"{"done":true,"eval_count":3}"#] {
            let parsed: OllamaGenerateResponse = serde_json::from_str(body).expect("valid body");
            let response = convert_ollama_response(parsed);
            assert_eq!(response.content, "");
            assert!(response.usage.is_none());
        }
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_seconds(&headers), None);

        headers.insert(RETRY_AFTER, "7".parse().expect("header value"));
        assert_eq!(retry_after_seconds(&headers), Some(7));

        headers.insert(
            RETRY_AFTER,
            "Wed, 21 Oct 2026 07:28:00 GMT".parse().expect("header value"),
        );
        assert_eq!(retry_after_seconds(&headers), None);
    }
}
