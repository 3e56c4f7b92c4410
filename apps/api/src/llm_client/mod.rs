/// LLM Client — the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion provider directly.
/// All LLM interactions MUST go through this module.
///
/// Wire format: OpenAI-compatible `/chat/completions` (Groq hosted).
/// Model is hardcoded — do not make configurable to prevent drift.
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod extract;
pub mod prompts;
pub mod schema;
pub mod stream;

#[cfg(test)]
pub mod testing;

pub use schema::{Validate, ValidationError};
pub use stream::CompletionStream;

pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
/// The model used for all completion calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key rejected or missing: {0}")]
    Auth(String),

    #[error("Model access denied for this account: {0}")]
    AccessDenied(String),

    #[error("LLM returned empty content")]
    EmptyResponse,

    #[error("LLM returned invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("No JSON value found in LLM output")]
    NoJsonFound,

    #[error("LLM response failed validation: {0}")]
    Schema(#[from] ValidationError),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Sampling options for a single completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            top_p: 0.95,
        }
    }
}

impl CompletionOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: &'static str,
}

/// Request body for `/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: &'static str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl ChatRequest {
    fn new(messages: Vec<ChatMessage>, opts: CompletionOptions) -> Self {
        Self {
            model: MODEL,
            messages,
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
            top_p: opts.top_p,
            response_format: None,
            stream: false,
        }
    }

    fn json_mode(mut self) -> Self {
        self.response_format = Some(ResponseFormat {
            format_type: "json_object",
        });
        self
    }

    fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Transport seam between `LlmClient` and the provider.
/// `HttpBackend` talks to the hosted endpoint; tests substitute a scripted one.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError>;

    async fn stream(&self, request: &ChatRequest) -> Result<CompletionStream, LlmError>;
}

/// reqwest-backed transport for the hosted chat-completions endpoint.
pub struct HttpBackend {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(api_base: String, api_key: Option<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_base,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    /// Refuses to send anything when the key is missing or still a template value.
    fn key(&self) -> Result<&str, LlmError> {
        match self.api_key.as_deref() {
            Some(key) if !is_placeholder_key(key) => Ok(key),
            Some(_) => Err(LlmError::Auth(
                "GROQ_API_KEY is a placeholder value".to_string(),
            )),
            None => Err(LlmError::Auth("GROQ_API_KEY is not set".to_string())),
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, LlmError> {
        let key = self.key()?;
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self.send(request).await?;
        let chat: ChatResponse = response.json().await?;
        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(chat)
    }

    async fn stream(&self, request: &ChatRequest) -> Result<CompletionStream, LlmError> {
        let response = self.send(request).await?;
        Ok(CompletionStream::from_response(response))
    }
}

/// Maps a non-success provider status onto the error taxonomy.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<ProviderError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => LlmError::Auth(message),
        StatusCode::FORBIDDEN => LlmError::AccessDenied(message),
        _ => LlmError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// True for empty keys and the template values shipped in `.env.example`.
pub(crate) fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim().to_ascii_lowercase();
    key.is_empty()
        || key == "changeme"
        || key == "placeholder"
        || (key.contains("your") && key.contains("key"))
}

/// The single LLM client used by every feature.
/// Cheap to clone; the backend is shared.
#[derive(Clone)]
pub struct LlmClient {
    backend: Arc<dyn CompletionBackend>,
}

impl LlmClient {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Builds a client for the hosted endpoint.
    pub fn http(api_base: String, api_key: Option<String>) -> Result<Self, LlmError> {
        Ok(Self::new(Arc::new(HttpBackend::new(api_base, api_key)?)))
    }

    /// Plain-text completion for a system + user prompt pair.
    pub async fn text_completion(
        &self,
        system: &str,
        user: &str,
        opts: CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = ChatRequest::new(
            vec![ChatMessage::system(system), ChatMessage::user(user)],
            opts,
        );
        self.complete_text(&request).await
    }

    /// JSON-mode completion deserialized straight into `T`. No repair, no retry.
    pub async fn json_completion<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
        opts: CompletionOptions,
    ) -> Result<T, LlmError> {
        self.chat_json(system, &[ChatMessage::user(user)], opts)
            .await
    }

    /// JSON-mode completion over an explicit multi-turn history.
    pub async fn chat_json<T: DeserializeOwned>(
        &self,
        system: &str,
        history: &[ChatMessage],
        opts: CompletionOptions,
    ) -> Result<T, LlmError> {
        let system = format!("{system}\n\n{}", prompts::JSON_ONLY_INSTRUCTION);
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend_from_slice(history);

        let request = ChatRequest::new(messages, opts).json_mode();
        let text = self.complete_text(&request).await?;
        serde_json::from_str(text.trim()).map_err(LlmError::InvalidJson)
    }

    /// `json_completion` followed by the structural validation step.
    pub async fn validated_json<T: DeserializeOwned + Validate>(
        &self,
        system: &str,
        user: &str,
        opts: CompletionOptions,
    ) -> Result<T, LlmError> {
        let value: T = self.json_completion(system, user, opts).await?;
        Ok(value.validate()?)
    }

    /// Streams text deltas as they arrive. Dropping the stream releases the connection.
    pub async fn stream_completion(
        &self,
        system: &str,
        user: &str,
        opts: CompletionOptions,
    ) -> Result<CompletionStream, LlmError> {
        let request = ChatRequest::new(
            vec![ChatMessage::system(system), ChatMessage::user(user)],
            opts,
        )
        .streaming();
        self.backend.stream(&request).await
    }

    async fn complete_text(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let response = self.backend.complete(request).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;

    #[test]
    fn test_401_maps_to_auth_error() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        let err = error_for_status(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, LlmError::Auth(ref m) if m == "Invalid API Key"));
    }

    #[test]
    fn test_403_maps_to_access_denied() {
        let err = error_for_status(StatusCode::FORBIDDEN, "model not enabled");
        assert!(matches!(err, LlmError::AccessDenied(ref m) if m == "model not enabled"));
    }

    #[test]
    fn test_other_status_maps_to_api_error() {
        let err = error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
    }

    #[test]
    fn test_placeholder_keys_detected() {
        assert!(is_placeholder_key(""));
        assert!(is_placeholder_key("   "));
        assert!(is_placeholder_key("your-groq-api-key"));
        assert!(is_placeholder_key("YOUR_API_KEY_HERE"));
        assert!(is_placeholder_key("changeme"));
        assert!(!is_placeholder_key("gsk_3f9a1c0b7e"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let backend = HttpBackend::new("http://127.0.0.1:9".to_string(), None).unwrap();
        let request = ChatRequest::new(vec![ChatMessage::user("hi")], Default::default());
        let err = backend.complete(&request).await.unwrap_err();
        assert!(matches!(err, LlmError::Auth(_)));
    }

    /// Local stand-in for the provider that answers every call with `status`.
    async fn provider_answering(status: axum::http::StatusCode, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new().route(
            "/chat/completions",
            axum::routing::post(move || async move { (status, body) }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_http_401_body_becomes_auth_error() {
        let base = provider_answering(
            axum::http::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Invalid API Key"}}"#,
        )
        .await;
        let llm = LlmClient::http(base, Some("gsk_test".to_string())).unwrap();
        let err = llm
            .text_completion("sys", "user", CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Auth(ref m) if m == "Invalid API Key"));
    }

    #[tokio::test]
    async fn test_http_403_becomes_access_denied_for_json_calls() {
        let base =
            provider_answering(axum::http::StatusCode::FORBIDDEN, "model not enabled").await;
        let llm = LlmClient::http(base, Some("gsk_test".to_string())).unwrap();
        let err = llm
            .json_completion::<serde_json::Value>("sys", "user", CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::AccessDenied(ref m) if m == "model not enabled"));
    }

    #[tokio::test]
    async fn test_http_error_status_fails_stream_before_first_delta() {
        let base =
            provider_answering(axum::http::StatusCode::INTERNAL_SERVER_ERROR, "overloaded").await;
        let llm = LlmClient::http(base, Some("gsk_test".to_string())).unwrap();
        let result = llm
            .stream_completion("sys", "user", CompletionOptions::default())
            .await;
        assert!(matches!(
            result,
            Err(LlmError::Api { status: 500, ref message }) if message == "overloaded"
        ));
    }

    #[tokio::test]
    async fn test_auth_error_is_identical_for_text_and_json() {
        let backend = ScriptedBackend::failing(|| LlmError::Auth("bad key".to_string()));
        let llm = LlmClient::new(backend.clone());

        let text_err = llm
            .text_completion("sys", "user", CompletionOptions::default())
            .await
            .unwrap_err();
        let json_err = llm
            .json_completion::<serde_json::Value>("sys", "user", CompletionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(text_err, LlmError::Auth(_)));
        assert!(matches!(json_err, LlmError::Auth(_)));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_access_denied_propagates() {
        let backend = ScriptedBackend::failing(|| LlmError::AccessDenied("no".to_string()));
        let llm = LlmClient::new(backend);
        let err = llm
            .text_completion("sys", "user", CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_reported_as_invalid_json() {
        let llm = LlmClient::new(ScriptedBackend::replying(["{not json"]));
        let err = llm
            .json_completion::<serde_json::Value>("sys", "user", CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_blank_content_is_empty_response() {
        let llm = LlmClient::new(ScriptedBackend::replying(["   "]));
        let err = llm
            .text_completion("sys", "user", CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_json_mode_request_shape() {
        let backend = ScriptedBackend::replying([r#"{"a":1}"#]);
        let llm = LlmClient::new(backend.clone());
        let value: serde_json::Value = llm
            .json_completion("You grade things.", "grade this", CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(value["a"], 1);

        let request = backend.last_request().unwrap();
        assert_eq!(request.model, MODEL);
        assert!(request.response_format.is_some());
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0]
            .content
            .contains(prompts::JSON_ONLY_INSTRUCTION));
        assert_eq!(request.messages[1], ChatMessage::user("grade this"));
    }

    #[test]
    fn test_request_serializes_wire_fields() {
        let request = ChatRequest::new(
            vec![ChatMessage::system("s"), ChatMessage::user("u")],
            CompletionOptions::default().with_max_tokens(512),
        )
        .json_mode();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], MODEL);
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_response_text_reads_first_choice() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}],
                       "usage":{"prompt_tokens":3,"completion_tokens":1,"total_tokens":4}}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("hello"));
    }

    #[test]
    fn test_response_without_choices_has_no_text() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(response.text().is_none());
    }
}
