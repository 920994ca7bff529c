use crate::gemini::consts::{API_KEY_HEADER, BASE_URL};
use crate::gemini::wire;
use crate::speech::SpeechSynthesizer;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use oracle_chat_types::{Base64EncodedAudioBytes, VoiceProfile};
use secrecy::{ExposeSecret, SecretString};

/// Speech collaborator requesting one-shot synthesis with a fixed voice.
pub struct GeminiSpeech {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    voice: VoiceProfile,
}

impl GeminiSpeech {
    pub fn new(api_key: SecretString, model: &str, voice: VoiceProfile) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            api_key,
            model: model.to_string(),
            voice,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn body(&self, text: &str) -> wire::GenerateContentRequest {
        wire::GenerateContentRequest {
            system_instruction: None,
            contents: vec![wire::Content::text(text)],
            generation_config: Some(wire::GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(wire::SpeechConfig {
                    voice_config: wire::VoiceConfig {
                        prebuilt_voice_config: wire::PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                }),
                ..wire::GenerationConfig::default()
            }),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSpeech {
    async fn synthesize(&self, text: &str) -> Result<Base64EncodedAudioBytes> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&self.body(text))
            .send()
            .await
            .context("failed to reach the synthesis endpoint")?
            .error_for_status()
            .context("synthesis endpoint rejected the request")?
            .json::<wire::GenerateContentResponse>()
            .await
            .context("failed to parse the synthesis response")?;

        response
            .first_inline_data()
            .map(|data| data.to_string())
            .ok_or_else(|| anyhow!("synthesis response carried no audio payload"))
    }
}
