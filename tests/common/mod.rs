//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use pond_providers::{ApiKey, ChatClient, ChatConfig};

/// Chat completion body carrying `content` as the first choice.
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })
}

/// Answers successive requests with successive replies, repeating the last one.
pub struct SequenceResponder {
    replies: Vec<String>,
    next: AtomicUsize,
}

impl SequenceResponder {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let idx = self.next.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .get(idx)
            .or_else(|| self.replies.last())
            .map_or("", String::as_str);
        ResponseTemplate::new(200).set_body_json(completion_body(reply))
    }
}

/// Mount a `/v1/chat/completions` endpoint answering with `replies` in order.
pub async fn mount_chat_sequence<I, S>(server: &MockServer, replies: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(SequenceResponder::new(replies))
        .mount(server)
        .await;
}

/// Mount a `/v1/chat/completions` endpoint that always answers with `content`.
pub async fn mount_chat_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(server)
        .await;
}

/// Client pointed at the mock server's `/v1` base.
pub fn chat_client(server: &MockServer) -> ChatClient {
    let config = ChatConfig::new(format!("{}/v1", server.uri()), ApiKey::new("lm-studio"), "test-model")
        .with_timeout(Duration::from_secs(5));
    ChatClient::new(config).expect("client builds")
}

/// Request bodies received by the server, parsed as JSON.
pub async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("request body is JSON"))
        .collect()
}
