//! Integration test: start the full gateway (config → providers → HTTP) against a fake Ollama,
//! then probe GET / and POST /chat. Also checks that startup fails when a provider cannot load.
//! The server tasks are left running when each test ends.

mod common;

use common::{fake_ollama, free_port, spawn_app, wait_ready, FAKE_MODEL};
use parley::config::{Config, ProviderBackend};
use parley::gateway;

fn config_for(ollama_url: &str, port: u16) -> Config {
    let mut config = Config::default();
    config.server.port = port;
    config.server.bind = "127.0.0.1".to_string();
    config.backends.ollama.base_url = Some(ollama_url.to_string());
    config.backends.ollama.timeout_secs = 5;
    config.pipeline.translator.model = Some(FAKE_MODEL.to_string());
    config.pipeline.generator.model = Some(FAKE_MODEL.to_string());
    config
}

#[tokio::test]
async fn gateway_health_http_responds_with_running() {
    let ollama = spawn_app(fake_ollama()).await;
    let port = free_port();
    let config = config_for(&ollama, port);

    let _gateway = tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let url = format!("http://127.0.0.1:{}/", port);
    let client = reqwest::Client::new();
    let resp = match wait_ready(&client, &url).await {
        Ok(r) => r,
        Err(e) => panic!("GET {} did not return 200 within 5s; last error: {}", url, e),
    };
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
    assert_eq!(json.get("port").and_then(|v| v.as_u64()), Some(port as u64));
    assert_eq!(json["providers"]["detector"], "builtin");
    assert_eq!(
        json["providers"]["generator"],
        format!("ollama:{}", FAKE_MODEL)
    );
    assert!(json["startedAt"].as_str().is_some());
}

#[tokio::test]
async fn chat_round_trip_through_ollama_backed_providers() {
    let ollama = spawn_app(fake_ollama()).await;
    let port = free_port();
    let config = config_for(&ollama, port);

    let _gateway = tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);
    wait_ready(&client, &format!("{}/", base))
        .await
        .expect("gateway ready");

    let resp = client
        .post(format!("{}/chat", base))
        .json(&serde_json::json!({
            "text": "Bonjour",
            "source_language": "english",
            "target_language": "french"
        }))
        .send()
        .await
        .expect("POST /chat");
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(json["original_text"], "Bonjour");
    assert_eq!(json["detected_language"], "french");
    assert_eq!(json["sentiment"]["sentiment"], "3 stars");
    assert_eq!(
        json["response"],
        "french: echo(100): english: Bonjour"
    );
}

#[tokio::test]
async fn gateway_refuses_to_start_when_model_missing() {
    let ollama = spawn_app(fake_ollama()).await;
    let mut config = config_for(&ollama, free_port());
    config.pipeline.generator.model = Some("absent-model".to_string());

    let err = gateway::run_gateway(config)
        .await
        .expect_err("startup must fail");
    let msg = format!("{:#}", err);
    assert!(msg.contains("absent-model"), "unexpected error: {}", msg);
    assert!(msg.contains("not available"), "unexpected error: {}", msg);
}

#[tokio::test]
async fn gateway_refuses_to_start_when_backend_unreachable() {
    let dead = format!("http://127.0.0.1:{}", free_port());
    let mut config = config_for(&dead, free_port());
    config.pipeline.sentiment.backend = ProviderBackend::Ollama;
    config.pipeline.sentiment.model = Some(FAKE_MODEL.to_string());

    let err = gateway::run_gateway(config)
        .await
        .expect_err("startup must fail");
    let msg = format!("{:#}", err);
    assert!(msg.contains("sentiment"), "unexpected error: {}", msg);
}
