#![allow(dead_code)]

use enhance_service::config::{EnhanceConfig, GeminiSettings, DEFAULT_SYSTEM_INSTRUCTION};
use enhance_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config;
use service_core::retry::RetryConfig;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-gemini-key-5f1c9a0e";
pub const TEST_MODEL: &str = "gemini-test-model";
pub const ENHANCE_PATH: &str = "/api/enhance-prompt";

pub fn generate_path() -> String {
    format!("/v1beta/models/{}:generateContent", TEST_MODEL)
}

/// Retry timings shrunk from seconds to tens of milliseconds.
pub fn test_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay: Duration::from_millis(20),
        max_jitter: Duration::from_millis(5),
    }
}

pub fn test_config(api_base_url: String, api_key: Option<&str>) -> EnhanceConfig {
    EnhanceConfig {
        common: Config { port: 0 },
        gemini: GeminiSettings {
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            model: TEST_MODEL.to_string(),
            api_base_url,
            timeout_secs: 5,
        },
        retry: test_retry_config(),
        system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        otlp_endpoint: None,
    }
}

/// A Gemini reply with a single candidate.
pub fn candidate_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP",
            "index": 0
        }],
        "usageMetadata": {
            "promptTokenCount": 12,
            "candidatesTokenCount": 40,
            "totalTokenCount": 52
        }
    })
}

/// Responder that records when each upstream call arrived.
pub struct RecordingResponder {
    template: ResponseTemplate,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl RecordingResponder {
    pub fn new(template: ResponseTemplate, arrivals: Arc<Mutex<Vec<Instant>>>) -> Self {
        Self { template, arrivals }
    }
}

impl Respond for RecordingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals
            .lock()
            .expect("arrivals lock poisoned")
            .push(Instant::now());
        self.template.clone()
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub upstream: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_key(Some(TEST_API_KEY)).await
    }

    pub async fn spawn_with_key(api_key: Option<&str>) -> Self {
        let upstream = MockServer::start().await;
        let config = test_config(format!("{}/v1beta", upstream.uri()), api_key);
        let port = spawn_application(config).await;

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            upstream,
            client: reqwest::Client::new(),
        }
    }

    pub async fn post_enhance(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, ENHANCE_PATH))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn upstream_calls(&self) -> Vec<Request> {
        self.upstream.received_requests().await.unwrap_or_default()
    }
}

/// Build and spawn the application, waiting until `/health` answers.
pub async fn spawn_application(config: EnhanceConfig) -> u16 {
    let app = Application::build(config)
        .await
        .expect("Failed to build test application");
    let port = app.port();

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let client = reqwest::Client::new();
    let health_url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        if client.get(&health_url).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    port
}

/// Read a response as text and fail if the API key leaked into it.
pub async fn body_without_key(response: reqwest::Response) -> Value {
    let text = response.text().await.expect("Failed to read body");
    assert!(
        !text.contains(TEST_API_KEY),
        "response body leaked the API key: {}",
        text
    );
    serde_json::from_str(&text).expect("Failed to parse JSON")
}
