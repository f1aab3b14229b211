use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::config::Config;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Fire-and-forget operator alerts over a Telegram bot. Failures are logged
/// and swallowed; an unreachable side channel never blocks delivery.
pub struct TelegramAlerter {
    http_client: Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramAlerter {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(
            TELEGRAM_API_BASE.to_string(),
            config.telegram_bot_token.clone(),
            config.telegram_chat_id.clone(),
        )
    }

    pub fn with_base_url(base_url: String, bot_token: String, chat_id: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            bot_token,
            chat_id,
        }
    }

    pub async fn notify(&self, text: &str) {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);

        let body = json!({
            "chat_id": self.chat_id,
            "text": format!("⚠️ {}", text),
        });

        match self.http_client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Operator alert delivered");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Operator alert rejected");
            }
            Err(e) => {
                warn!(error = %e, "Failed to deliver operator alert");
            }
        }
    }
}
