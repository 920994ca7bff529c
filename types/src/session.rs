use crate::transcript::Role;

/// Whether a text generation is currently outstanding.
///
/// While `AwaitingResponse`, new submissions are rejected; exactly one
/// generation is in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GenerationState {
    Idle,
    AwaitingResponse,
}

/// Per-session options the user can influence between turns.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionOptions {
    /// When set, the next submission carries an extended-reasoning budget
    /// hint. Captured per turn at submission time.
    deep_reasoning_enabled: bool,

    /// Instruction text establishing assistant identity and tone. Constant
    /// for the lifetime of the session.
    system_persona: String,
}

impl SessionOptions {
    pub fn new(system_persona: &str) -> Self {
        Self {
            deep_reasoning_enabled: false,
            system_persona: system_persona.to_string(),
        }
    }

    pub fn deep_reasoning_enabled(&self) -> bool {
        self.deep_reasoning_enabled
    }

    pub fn system_persona(&self) -> &str {
        &self.system_persona
    }

    pub fn toggle_deep_reasoning(&mut self) {
        self.deep_reasoning_enabled = !self.deep_reasoning_enabled;
    }
}

/// One message of conversation content carried in a `ChatRequest`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    role: Role,
    text: String,
}

impl ChatMessage {
    pub fn new(role: Role, text: &str) -> Self {
        Self {
            role,
            text: text.to_string(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Everything the chat collaborator needs for one streamed exchange.
///
/// The final message is the user text being answered; earlier messages are
/// the accumulated conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    system_persona: String,
    deep_reasoning: bool,
    messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::new()
    }

    pub fn system_persona(&self) -> &str {
        &self.system_persona
    }

    pub fn deep_reasoning(&self) -> bool {
        self.deep_reasoning
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

pub struct ChatRequestBuilder {
    request: ChatRequest,
}

impl Default for ChatRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: ChatRequest {
                system_persona: String::new(),
                deep_reasoning: false,
                messages: Vec::new(),
            },
        }
    }

    pub fn with_system_persona(mut self, persona: &str) -> Self {
        self.request.system_persona = persona.to_string();
        self
    }

    pub fn with_deep_reasoning(mut self, enabled: bool) -> Self {
        self.request.deep_reasoning = enabled;
        self
    }

    pub fn with_message(mut self, role: Role, text: &str) -> Self {
        self.request.messages.push(ChatMessage::new(role, text));
        self
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.request.messages = messages;
        self
    }

    pub fn build(self) -> ChatRequest {
        self.request
    }
}
