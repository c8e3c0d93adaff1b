//! Telegram transport built on teloxide

use async_trait::async_trait;
use serde_json::Value;
use teloxide::prelude::*;
use tracing::{debug, error};

use crate::config::BotConfig;
use crate::utils::errors::Result;
use crate::UserId;
use super::{render_text, Transport};

/// Sends conversation output through the Telegram Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(token: &str) -> Self {
        Self { bot: Bot::new(token) }
    }

    /// Use a custom Bot API server
    pub fn with_api_url(token: &str, api_url: &str) -> Result<Self> {
        let url = url::Url::parse(api_url)?;
        Ok(Self { bot: Bot::new(token).set_api_url(url) })
    }

    pub fn from_settings(config: &BotConfig) -> Result<Self> {
        match &config.api_url {
            Some(api_url) => Self::with_api_url(&config.token, api_url),
            None => Ok(Self::new(&config.token)),
        }
    }

    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, user: UserId, message: Value) -> Result<()> {
        let text = render_text(&message);
        match self.bot.send_message(ChatId(user), text).await {
            Ok(sent) => {
                debug!(user_id = user, message_id = sent.id.0, "Message sent");
                Ok(())
            }
            Err(e) => {
                error!(user_id = user, error = %e, "Failed to send message");
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("api_url", &self.bot.api_url().to_string())
            .finish_non_exhaustive()
    }
}
