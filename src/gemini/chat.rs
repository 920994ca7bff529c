use crate::chat::ChatModel;
use crate::gemini::consts::{API_KEY_HEADER, BASE_URL, DEEP_REASONING_BUDGET};
use crate::gemini::sse::SseFramer;
use crate::gemini::wire;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use oracle_chat_types::{ChatRequest, ChatStreamEvent, Role};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Chat collaborator speaking the streaming generateContent protocol.
pub struct GeminiChat {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl GeminiChat {
    pub fn new(api_key: SecretString, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            api_key,
            model: model.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn body(request: &ChatRequest) -> wire::GenerateContentRequest {
        let contents = request
            .messages()
            .iter()
            .map(|message| wire::Content::message(wire_role(message.role()), message.text()))
            .collect();

        let generation_config = if request.deep_reasoning() {
            Some(wire::GenerationConfig {
                thinking_config: Some(wire::ThinkingConfig {
                    thinking_budget: DEEP_REASONING_BUDGET,
                }),
                ..wire::GenerationConfig::default()
            })
        } else {
            None
        };

        wire::GenerateContentRequest {
            system_instruction: Some(wire::Content::text(request.system_persona())),
            contents,
            generation_config,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn open_stream(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<ChatStreamEvent>> {
        let url = format!(
            "{}/models/{}:streamGenerateContent",
            self.base_url, self.model
        );
        let response = self
            .http
            .post(&url)
            .query(&[("alt", "sse")])
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&Self::body(&request))
            .send()
            .await
            .context("failed to reach the chat endpoint")?
            .error_for_status()
            .context("chat endpoint rejected the request")?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut framer = SseFramer::new();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::warn!("chat stream transport error: {}", e);
                        let _ = tx.send(ChatStreamEvent::Failed(e.to_string())).await;
                        return;
                    }
                };

                for payload in framer.push(&chunk) {
                    let message =
                        match serde_json::from_str::<wire::GenerateContentResponse>(&payload) {
                            Ok(message) => message,
                            Err(e) => {
                                tracing::warn!("malformed chat stream payload: {}", e);
                                let _ = tx.send(ChatStreamEvent::Failed(e.to_string())).await;
                                return;
                            }
                        };

                    if let Some(text) = message.first_text() {
                        if tx.send(ChatStreamEvent::Fragment(text)).await.is_err() {
                            // Receiver dropped; nobody is listening anymore.
                            return;
                        }
                    }
                }
            }

            let _ = tx.send(ChatStreamEvent::Completed).await;
        });

        Ok(rx)
    }
}
