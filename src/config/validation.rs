//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::conversations;
use crate::utils::errors::{ConversationError, Result};
use super::{Settings, StorageBackendKind};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_storage_config(&settings.storage)?;
    validate_session_config(&settings.sessions)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(ConversationError::Config(
            "Bot token is required".to_string()
        ));
    }

    if let Some(api_url) = &config.api_url {
        url::Url::parse(api_url)?;
    }

    if conversations::by_name(&config.conversation).is_none() {
        return Err(ConversationError::Config(
            format!("Unknown conversation: {}. Available: {:?}", config.conversation, conversations::NAMES)
        ));
    }

    Ok(())
}

/// Validate storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.backend == StorageBackendKind::Redis && config.redis_url.is_empty() {
        return Err(ConversationError::Config(
            "Redis URL is required for the redis storage backend".to_string()
        ));
    }

    if config.ttl_seconds == Some(0) {
        return Err(ConversationError::Config(
            "Storage TTL must be greater than 0 when set".to_string()
        ));
    }

    Ok(())
}

/// Validate session configuration
fn validate_session_config(config: &super::SessionConfig) -> Result<()> {
    if config.idle_ttl_seconds > 0 && config.reap_interval_seconds == 0 {
        return Err(ConversationError::Config(
            "Reap interval must be greater than 0 when idle TTL is set".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(ConversationError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(ConversationError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "12345:test_token".to_string();
        settings
    }

    #[test]
    fn test_default_settings_need_token() {
        let err = Settings::default().validate().unwrap_err();
        assert!(err.to_string().contains("Bot token"));
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_unknown_conversation_rejected() {
        let mut settings = valid_settings();
        settings.bot.conversation = "nope".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_redis_requires_url() {
        let mut settings = valid_settings();
        settings.storage.backend = StorageBackendKind::Redis;
        settings.storage.redis_url.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_reaper_interval_required() {
        let mut settings = valid_settings();
        settings.sessions.idle_ttl_seconds = 60;
        settings.sessions.reap_interval_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert!(settings.validate().is_err());
    }
}
