use crate::session::GenerationState;

/// Events a chat collaborator emits for one streamed reply.
///
/// Fragments arrive in delivery order; the sequence ends with exactly one
/// `Completed` or `Failed`. Fragment granularity is not guaranteed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStreamEvent {
    Fragment(String),
    Completed,
    Failed(String),
}

/// Change notifications for the presentation layer.
///
/// Subscribers redraw from the controller's current snapshot; the event only
/// says what kind of thing changed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TranscriptChanged,
    GenerationStateChanged(GenerationState),
    OptionsChanged,
}
