//! Mock Telegram API server for testing
//!
//! Simulates the `sendMessage` endpoint of the Telegram Bot API with wiremock
//! and exposes what the bot sent.

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock Telegram API server
pub struct TelegramMockServer {
    pub server: MockServer,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub success: bool,
    pub delay_ms: Option<u64>,
}

impl Default for MockResponseConfig {
    fn default() -> Self {
        Self {
            success: true,
            delay_ms: None,
        }
    }
}

impl TelegramMockServer {
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Base URL to hand to the bot as its API server
    pub fn api_url(&self) -> String {
        self.server.uri()
    }

    /// Setup mock for the sendMessage endpoint
    pub async fn mock_send_message(&self, token: &str, config: MockResponseConfig) {
        let body = if config.success {
            json!({
                "ok": true,
                "result": {
                    "message_id": 123,
                    "from": {
                        "id": 12345,
                        "is_bot": true,
                        "first_name": "TestBot",
                        "username": "test_bot"
                    },
                    "chat": {
                        "id": 42,
                        "first_name": "Test",
                        "type": "private"
                    },
                    "date": 1640995200,
                    "text": "Test message"
                }
            })
        } else {
            json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })
        };

        let mut response = ResponseTemplate::new(if config.success { 200 } else { 400 })
            .set_body_json(body);
        if let Some(delay) = config.delay_ms {
            response = response.set_delay(std::time::Duration::from_millis(delay));
        }

        Mock::given(method("POST"))
            .and(path(format!("/bot{}/SendMessage", token)))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Parsed bodies of every sendMessage request, in arrival order
    pub async fn sent_messages(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path().ends_with("/SendMessage"))
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    /// Texts of every sendMessage request, in arrival order
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent_messages()
            .await
            .iter()
            .filter_map(|body| body["text"].as_str().map(str::to_string))
            .collect()
    }
}
