pub mod audio;
pub mod events;
pub mod session;
pub mod transcript;

pub use audio::{Base64EncodedAudioBytes, VoiceProfile};
pub use events::{ChatStreamEvent, SessionEvent};
pub use session::{ChatMessage, ChatRequest, GenerationState, SessionOptions};
pub use transcript::{Role, Transcript, Turn};
