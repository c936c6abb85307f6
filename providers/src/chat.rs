//! OpenAI-compatible chat completions client.
//!
//! Sends `POST {base_url}/chat/completions` with a bearer token and reads the
//! first choice's message content. Works against LM Studio, llama.cpp server and
//! the hosted OpenAI API alike.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::{
    GenerationClient, GenerationError, GenerationFut, GenerationRequest, http_client_with_timeout,
    read_capped_error_body,
};

/// Bearer token for the backend.
///
/// `Debug` is manually implemented to redact the key value.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    base_url: String,
    api_key: ApiKey,
    model: String,
    timeout: Duration,
}

impl ChatConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: ApiKey, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            timeout: Duration::from_secs(120),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    config: ChatConfig,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, GenerationError> {
        let http = http_client_with_timeout(config.timeout)?;
        Ok(Self { config, http })
    }

    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.config.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "top_p": request.top_p,
        });

        tracing::debug!(
            model = %self.config.model,
            temperature = request.temperature,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            tracing::warn!(status = status.as_u16(), "Chat completion request failed");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        parse_completion(&text)
    }
}

fn parse_completion(raw: &str) -> Result<String, GenerationError> {
    let parsed: CompletionResponse =
        serde_json::from_str(raw).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    let Some(choice) = parsed.choices.into_iter().next() else {
        return Err(GenerationError::Malformed(
            "response contained no choices".to_string(),
        ));
    };
    // Blank content is a valid reply; the enforcers substitute their fallbacks.
    let content = choice.message.content.unwrap_or_default();
    Ok(content.trim().to_string())
}

impl GenerationClient for ChatClient {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFut<'a> {
        Box::pin(self.complete(request))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{ApiKey, ChatClient, ChatConfig, parse_completion};
    use crate::{GenerationClient, GenerationError, GenerationRequest};

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    fn client_for(server: &MockServer) -> ChatClient {
        let config = ChatConfig::new(
            format!("{}/v1/", server.uri()),
            ApiKey::new("lm-studio"),
            "test-model",
        )
        .with_timeout(Duration::from_secs(5));
        ChatClient::new(config).expect("client builds")
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let rendered = format!("{:?}", ApiKey::new("sk-very-secret"));
        assert!(!rendered.contains("sk-very-secret"));
    }

    #[test]
    fn config_normalizes_base_url() {
        let config = ChatConfig::new("http://127.0.0.1:1234/v1/", ApiKey::new("k"), "m");
        assert_eq!(
            config.completions_url(),
            "http://127.0.0.1:1234/v1/chat/completions"
        );
    }

    #[test]
    fn parse_trims_content() {
        let raw = completion("  You named it. What stands out?  \n").to_string();
        assert_eq!(
            parse_completion(&raw).unwrap(),
            "You named it. What stands out?"
        );
    }

    #[test]
    fn parse_rejects_missing_choices() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn parse_accepts_blank_content() {
        let raw = completion("   ").to_string();
        assert_eq!(parse_completion(&raw).unwrap(), "");

        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert_eq!(parse_completion(raw).unwrap(), "");
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(matches!(
            parse_completion("<html>"),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn sends_request_contract_and_reads_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer lm-studio"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "top_p": 0.9,
                "messages": [
                    { "role": "system", "content": "be plain" },
                    { "role": "user", "content": "Title: Lake" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Calm water.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = GenerationRequest::instructed("be plain", "Title: Lake", 0.16);

        let reply = client.generate(&request).await.unwrap();
        assert_eq!(reply, "Calm water.");
    }

    #[tokio::test]
    async fn non_success_status_is_reported_once() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = GenerationRequest::instructed("sys", "ctx", 0.1);

        match client.generate(&request).await {
            Err(GenerationError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "model loading");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = ChatConfig::new(
            format!("{}/v1", server.uri()),
            ApiKey::new("k"),
            "test-model",
        )
        .with_timeout(Duration::from_millis(200));
        let client = ChatClient::new(config).unwrap();
        let request = GenerationRequest::instructed("sys", "ctx", 0.1);

        assert!(matches!(
            client.generate(&request).await,
            Err(GenerationError::Timeout)
        ));
    }
}
