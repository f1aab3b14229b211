use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

use whatsapp_service::clients::alerter::TelegramAlerter;

/// Test: an alert posts to the bot's sendMessage endpoint with the chat id
#[tokio::test]
async fn test_alert_posts_to_telegram() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .and(body_partial_json(serde_json::json!({
            "chat_id": "42",
            "text": "⚠️ WhatsApp disconnected: socket closed",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let alerter = TelegramAlerter::with_base_url(
        mock_server.uri(),
        "test-token".to_string(),
        "42".to_string(),
    );

    alerter.notify("WhatsApp disconnected: socket closed").await;
}

/// Test: a rejected alert is swallowed, never propagated
#[tokio::test]
async fn test_failed_alert_is_swallowed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let alerter = TelegramAlerter::with_base_url(
        mock_server.uri(),
        "test-token".to_string(),
        "42".to_string(),
    );

    alerter.notify("anything").await;
}
