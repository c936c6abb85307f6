//! Text-generation clients for Memory Pond.
//!
//! # Architecture
//!
//! The ritual engine talks to the backend through one seam:
//!
//! - [`GenerationClient`] - takes a [`GenerationRequest`] and yields the generated text
//! - [`chat`] - OpenAI-compatible `/chat/completions` client (LM Studio, llama.cpp, OpenAI)
//! - [`mock`] - scripted client that replays queued replies, for tests
//!
//! # Error Handling
//!
//! Every failure (transport, timeout, non-success status, malformed body) is a
//! [`GenerationError`]. There is deliberately no retry layer: one request is made
//! per call and its outcome is final.

pub mod chat;
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub use pond_types::{ChatMessage, ChatRole, GenerationRequest};

pub use chat::{ApiKey, ChatClient, ChatConfig};
pub use mock::ScriptedClient;

const CONNECT_TIMEOUT_SECS: u64 = 30;

// Keep idle connections around between ritual turns.
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request timed out")]
    Timeout,
    #[error("generation request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("generation backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Transport(err)
        }
    }
}

pub type GenerationFut<'a> = Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// A backend that turns an instruction + context request into text.
///
/// Implementations perform exactly one request per call.
pub trait GenerationClient: Send + Sync {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFut<'a>;
}

impl<T: GenerationClient + ?Sized> GenerationClient for &T {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFut<'a> {
        (**self).generate(request)
    }
}

impl<T: GenerationClient + ?Sized> GenerationClient for Arc<T> {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFut<'a> {
        (**self).generate(request)
    }
}

impl<T: GenerationClient + ?Sized> GenerationClient for Box<T> {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFut<'a> {
        (**self).generate(request)
    }
}

fn base_client_builder() -> reqwest::ClientBuilder {
    use reqwest::header::{HeaderMap, HeaderValue};

    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        "User-Agent",
        HeaderValue::from_static(concat!("memory-pond/", env!("CARGO_PKG_VERSION"))),
    );

    // Local backends are plain HTTP, so https_only stays off.
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

pub fn http_client_with_timeout(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder().timeout(timeout).build()
}

pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
