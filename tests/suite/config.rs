//! Settings resolved from a config file drive the generation client

use std::collections::HashMap;

use pond_config::PondConfig;
use pond_core::RitualEngine;
use pond_providers::{ApiKey, ChatClient, ChatConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::completion_body;

#[tokio::test]
async fn config_file_settings_reach_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer from-env-var"))
        .and(body_partial_json(serde_json::json!({ "model": "local-llama" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("You swam early. What was the water like?")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[generation]
base_url = "{}/v1/"
api_key = "${{POND_TEST_KEY}}"
model = "local-llama"
timeout_secs = 5

[storage]
archive_file = "~/archive/memories.jsonl"
"#,
            server.uri()
        ),
    )
    .unwrap();

    let env: HashMap<&str, &str> = HashMap::from([("POND_TEST_KEY", "from-env-var")]);
    let config = PondConfig::load_from(&config_path).unwrap().unwrap();
    let settings = config.resolve_with(
        &|name| env.get(name).map(|v| (*v).to_string()),
        Some(dir.path()),
    );

    assert_eq!(settings.archive_path, dir.path().join("archive").join("memories.jsonl"));
    assert_eq!(settings.sessions_path, dir.path().join(".pond").join("sessions.json"));
    assert!(!format!("{settings:?}").contains("from-env-var"));

    let client = ChatClient::new(
        ChatConfig::new(settings.base_url, ApiKey::new(settings.api_key), settings.model)
            .with_timeout(settings.timeout),
    )
    .unwrap();
    let engine = RitualEngine::new(client);

    let (_, turn) = engine.begin("Lake", "an early swim").await.unwrap();
    assert_eq!(turn.body, "You swam early. What was the water like?");
}
