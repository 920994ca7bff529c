use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use oracle_chat_types::{ChatRequest, ChatStreamEvent};
use tokio::sync::mpsc;

// The `ChatModel` trait is the seam between the session controller and the
// hosted language model. The controller only ever sees an ordered channel of
// fragment events, so tests drive it with a mock and a hand-fed channel
// instead of a network connection.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Opens one streamed exchange.
    ///
    /// Fragments arrive on the returned channel in delivery order and the
    /// sequence ends with exactly one `Completed` or `Failed` event. An error
    /// here means the exchange could not be opened at all.
    async fn open_stream(&self, request: ChatRequest)
        -> Result<mpsc::Receiver<ChatStreamEvent>>;
}
