//! Error types for the lead bot.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("{method} rejected by the Bot API: {description}")]
    Api { method: String, description: String },

    #[error("HTTP error: {0}")]
    Http(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_includes_hint() {
        let err = ConfigError::MissingRequired {
            key: "BOT_TOKEN".into(),
            hint: "Ask @BotFather.".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required configuration: BOT_TOKEN. Ask @BotFather."
        );
    }

    #[test]
    fn api_error_names_method() {
        let err = ChannelError::Api {
            method: "setWebhook".into(),
            description: "Bad Request: bad webhook".into(),
        };
        assert_eq!(
            err.to_string(),
            "setWebhook rejected by the Bot API: Bad Request: bad webhook"
        );
    }
}
