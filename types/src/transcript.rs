#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// One message unit in the transcript.
///
/// User content is fixed at creation. Assistant content is rewritten by the
/// controller while the reply streams in, then left alone.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    role: Role,
    content: String,

    /// Whether deep-reasoning mode was active when this turn was created.
    /// Informational only; never changes afterwards.
    deep_reasoning_requested: bool,
}

impl Turn {
    pub fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            content: text.to_string(),
            deep_reasoning_requested: false,
        }
    }

    pub fn assistant(text: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: text.to_string(),
            deep_reasoning_requested: false,
        }
    }

    /// An empty assistant turn awaiting streamed content.
    pub fn assistant_placeholder(deep_reasoning_requested: bool) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            deep_reasoning_requested,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn deep_reasoning_requested(&self) -> bool {
        self.deep_reasoning_requested
    }
}

/// The ordered history of turns for one session.
///
/// Append-only: turns are never removed or reordered. The only mutation of an
/// existing turn is the controller rewriting assistant content during
/// streaming.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// A fresh transcript holding the fixed greeting as its single turn.
    pub fn seeded(greeting: &str) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    /// Appends a user turn and returns its index.
    pub fn push_user(&mut self, text: &str) -> usize {
        self.turns.push(Turn::user(text));
        self.turns.len() - 1
    }

    /// Appends an empty assistant turn and returns its index.
    pub fn push_assistant_placeholder(&mut self, deep_reasoning_requested: bool) -> usize {
        self.turns
            .push(Turn::assistant_placeholder(deep_reasoning_requested));
        self.turns.len() - 1
    }

    /// Replaces the content of the turn at `index`. Out-of-range indices are
    /// ignored.
    pub fn rewrite(&mut self, index: usize, content: &str) {
        if let Some(turn) = self.turns.get_mut(index) {
            turn.content = content.to_string();
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
