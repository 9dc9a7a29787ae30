//! Shared helpers for integration tests: free ports and an in-process fake of the Ollama API.

#![allow(dead_code)]

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::time::Duration;

pub const FAKE_MODEL: &str = "test-model:latest";

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Serve `app` on a fresh loopback port; returns the base URL. The task runs until the test ends.
pub async fn spawn_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// Poll `url` until it answers 200 or 5s pass.
pub async fn wait_ready(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, String> {
    let mut last_err = String::from("no attempt");
    for _ in 0..100 {
        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => last_err = format!("status {}", resp.status()),
            Err(e) => last_err = e.to_string(),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Err(last_err)
}

fn message(body: &Value, role: &str) -> String {
    body["messages"]
        .as_array()
        .and_then(|msgs| msgs.iter().find(|m| m["role"] == role))
        .and_then(|m| m["content"].as_str())
        .unwrap_or("")
        .to_string()
}

/// Answers by looking at the system prompt:
/// language id ("french" for text containing "Bonjour"), sentiment JSON,
/// translation (`<target>: <text>`, or HTTP 500 when the text contains "untranslatable"),
/// anything else is a chat reply (`echo(<num_predict>): <text>`, or HTTP 500 for "fail").
async fn fake_chat(Json(body): Json<Value>) -> Result<Json<Value>, (StatusCode, String)> {
    let system = message(&body, "system");
    let user = message(&body, "user");
    let content = if system.contains("Identify the language") {
        let label = if user.contains("Bonjour") { "french" } else { "english" };
        label.to_string()
    } else if system.contains("sentiment") {
        r#"{"label": "4 stars", "score": 0.8}"#.to_string()
    } else if system.starts_with("Translate") {
        if user.contains("untranslatable") {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "model crashed".to_string()));
        }
        let target = system
            .split(" to ")
            .nth(1)
            .and_then(|rest| rest.split('.').next())
            .unwrap_or("?");
        format!("{}: {}", target, user)
    } else {
        if user == "fail" {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "generation crashed".to_string()));
        }
        let budget = body["options"]["num_predict"].as_u64().unwrap_or(0);
        format!("echo({}): {}", budget, user)
    };
    Ok(Json(json!({
        "model": body["model"],
        "message": { "role": "assistant", "content": content },
        "done": true
    })))
}

async fn fake_tags() -> Json<Value> {
    Json(json!({ "models": [ { "name": FAKE_MODEL, "size": 1 } ] }))
}

pub fn fake_ollama() -> Router {
    Router::new()
        .route("/api/tags", get(fake_tags))
        .route("/api/chat", post(fake_chat))
}
