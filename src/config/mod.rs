use std::env;

/// Runtime configuration for the conversion bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token (required in production, empty in tests)
    pub bot_token: String,

    /// Directory for raw and header-rewritten intake files (default: "uploads")
    pub upload_dir: String,

    /// Directory for converted output files (default: "outputs")
    pub output_dir: String,

    /// Path or name of the external conversion binary (default: "PVRTexToolCLI")
    pub converter_path: String,

    /// Pixel format passed to the conversion tool (default: "r8g8b8a8")
    pub output_pixel_format: String,

    /// Long-poll timeout for getUpdates, in seconds (default: 50)
    pub poll_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            upload_dir: "uploads".to_string(),
            output_dir: "outputs".to_string(),
            converter_path: "PVRTexToolCLI".to_string(),
            output_pixel_format: "r8g8b8a8".to_string(),
            poll_timeout_secs: 50,
        }
    }
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            bot_token: env::var("BOT_TOKEN").unwrap_or(default.bot_token),

            upload_dir: env::var("UPLOAD_DIR").unwrap_or(default.upload_dir),

            output_dir: env::var("OUTPUT_DIR").unwrap_or(default.output_dir),

            converter_path: env::var("PVRTEXTOOL_PATH").unwrap_or(default.converter_path),

            output_pixel_format: env::var("OUTPUT_PIXEL_FORMAT")
                .unwrap_or(default.output_pixel_format),

            poll_timeout_secs: env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.poll_timeout_secs),
        }
    }

    /// Create config for development (short poll timeout, tool from PATH)
    pub fn development() -> Self {
        Self {
            poll_timeout_secs: 5,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BotConfig::default();
        assert_eq!(config.upload_dir, "uploads");
        assert_eq!(config.output_dir, "outputs");
        assert_eq!(config.converter_path, "PVRTexToolCLI");
        assert_eq!(config.output_pixel_format, "r8g8b8a8");
        assert_eq!(config.poll_timeout_secs, 50);
    }

    #[test]
    fn test_development_config() {
        let config = BotConfig::development();
        assert_eq!(config.poll_timeout_secs, 5);
        assert_eq!(config.output_pixel_format, "r8g8b8a8");
    }
}
