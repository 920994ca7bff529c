pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Token budget passed as the extended-reasoning hint when deep reasoning is
/// enabled for a turn.
pub const DEEP_REASONING_BUDGET: i32 = 32_768;
