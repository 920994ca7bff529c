pub mod chat;
pub mod config;
pub mod gemini;
pub mod persona;
pub mod session;
pub mod speech;

pub use oracle_chat_types as types;
pub use oracle_chat_utils as utils;

pub use chat::ChatModel;
pub use session::{OracleSession, SessionSnapshot, FAILURE_MESSAGE, GREETING};
pub use speech::{AudioOutput, SpeechSynthesizer};
