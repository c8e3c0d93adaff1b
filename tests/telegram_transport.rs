//! Telegram transport against a mock Bot API server

mod helpers;

use std::sync::Arc;
use assert_matches::assert_matches;
use serde_json::json;
use serial_test::serial;

use chatbot_coroutine::{
    conversations, ConversationError, MemoryStorage, Scheduler, TelegramTransport, Transport,
};
use helpers::*;

async fn transport_for(mock: &TelegramMockServer) -> TelegramTransport {
    TelegramTransport::with_api_url(&test_bot_token(), &mock.api_url()).unwrap()
}

#[tokio::test]
#[serial]
async fn test_send_posts_send_message() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(&test_bot_token(), MockResponseConfig::default()).await;
    let transport = transport_for(&mock).await;

    transport.send(42, json!("hello")).await.unwrap();
    transport.send(42, json!({"n": 1})).await.unwrap();

    let bodies = mock.sent_messages().await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["chat_id"], json!(42));
    assert_eq!(bodies[0]["text"], json!("hello"));
    assert_eq!(bodies[1]["text"], json!("{\"n\":1}"));
}

#[tokio::test]
#[serial]
async fn test_api_error_is_reported() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(&test_bot_token(), MockResponseConfig { success: false, delay_ms: None }).await;
    let transport = transport_for(&mock).await;

    let result = transport.send(42, json!("hello")).await;
    assert_matches!(result, Err(ConversationError::Telegram(_)));
}

#[tokio::test]
#[serial]
async fn test_invalid_api_url_rejected() {
    let result = TelegramTransport::with_api_url(&test_bot_token(), "not a url");
    assert_matches!(result, Err(ConversationError::UrlParse(_)));
}

#[tokio::test]
#[serial]
async fn test_foo_bar_over_telegram() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(&test_bot_token(), MockResponseConfig { success: true, delay_ms: Some(20) }).await;
    let transport = Arc::new(transport_for(&mock).await);
    let conversation = conversations::by_name("foo_bar").unwrap();
    let scheduler = Scheduler::new(conversation, Arc::new(MemoryStorage::new()), transport);

    scheduler.respond(42, json!("/start")).await;
    scheduler.respond(42, json!("x")).await;
    assert!(scheduler.respond(42, json!("y")).await.is_completed());

    assert_eq!(
        mock.sent_texts().await,
        vec!["Tell me foo!", "Tell me bar!", "foo: x bar: y"]
    );
}

#[tokio::test]
#[serial]
async fn test_send_failure_goes_to_error_sink() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message(&test_bot_token(), MockResponseConfig { success: false, delay_ms: None }).await;
    let transport = Arc::new(transport_for(&mock).await);
    let conversation = conversations::by_name("foo_bar").unwrap();
    let scheduler = Scheduler::new(conversation, Arc::new(MemoryStorage::new()), transport);

    let outcome = scheduler.respond(42, json!("hi")).await;
    assert_matches!(outcome.error(), Some(ConversationError::Telegram(_)));
}
