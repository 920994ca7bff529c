//! Concrete collaborators backed by the hosted Gemini generative API.

mod chat;
pub mod consts;
mod speech;
mod sse;
mod wire;

pub use chat::GeminiChat;
pub use speech::GeminiSpeech;
