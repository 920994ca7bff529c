//! Application Configuration Module
//!
//! Centralizes everything the crate reads from the environment and provides
//! a single struct the demo and embedders can pass around.

use crate::gemini::consts::{DEFAULT_CHAT_MODEL, DEFAULT_TTS_MODEL, GEMINI_API_KEY};
use oracle_chat_types::VoiceProfile;
use secrecy::SecretString;
use std::env;
use std::str::FromStr;
use tracing::Level;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    gemini_api_key: SecretString,
    chat_model: String,
    tts_model: String,
    voice: VoiceProfile,
    log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GEMINI_API_KEY`: Your secret key for the hosted generative API. Required.
    // *   `ORACLE_CHAT_MODEL`: (Optional) Model used for text generation.
    // *   `ORACLE_TTS_MODEL`: (Optional) Model used for speech synthesis.
    // *   `ORACLE_VOICE`: (Optional) Prebuilt voice name. Defaults to "Fenrir".
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();

        let gemini_api_key = env::var(GEMINI_API_KEY)
            .map_err(|_| ConfigError::MissingVar(GEMINI_API_KEY.to_string()))?
            .into();

        // Provide defaults for non-critical variables.
        let chat_model =
            env::var("ORACLE_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        let tts_model =
            env::var("ORACLE_TTS_MODEL").unwrap_or_else(|_| DEFAULT_TTS_MODEL.to_string());

        // Unknown voice names become VoiceProfile::Custom, so this never fails.
        let voice = env::var("ORACLE_VOICE")
            .ok()
            .and_then(|s| VoiceProfile::from_str(&s).ok())
            .unwrap_or_default();

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            gemini_api_key,
            chat_model,
            tts_model,
            voice,
            log_level,
        })
    }

    pub fn gemini_api_key(&self) -> &SecretString {
        &self.gemini_api_key
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn tts_model(&self) -> &str {
        &self.tts_model
    }

    pub fn voice(&self) -> &VoiceProfile {
        &self.voice
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }
}
