use crate::chat::ChatModel;
use crate::speech::{AudioOutput, SpeechSynthesizer};
use anyhow::{bail, Context, Result};
use oracle_chat_types::{
    ChatMessage, ChatRequest, ChatStreamEvent, GenerationState, SessionEvent, SessionOptions,
    Transcript,
};
use oracle_chat_utils::audio::{decode_pcm16, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
use oracle_chat_utils::playback::Speaker;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Fixed greeting seeded into every fresh transcript.
pub const GREETING: &str =
    "Identity Verified. Sovereign Systems Online. How can I accelerate your infrastructure today?";

/// Fixed user-visible message written over the placeholder turn when a
/// generation fails.
pub const FAILURE_MESSAGE: &str =
    "Connection interrupted. Neural mesh unstable. Please try again.";

type OutputFactory = Box<dyn Fn() -> Result<Arc<dyn AudioOutput>> + Send + Sync>;

struct SessionState {
    transcript: Transcript,
    generation: GenerationState,
    options: SessionOptions,
}

/// Read-only view of the session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SessionSnapshot {
    pub transcript: Transcript,
    pub generation: GenerationState,
    pub options: SessionOptions,
}

/// The assistant session controller.
///
/// Owns the transcript and generation state, drives one streamed exchange at
/// a time against the chat collaborator, and plays synthesized speech on
/// request. The presentation layer subscribes for change notifications and
/// reads the current `snapshot()`; its only mutation entry points are
/// [`submit_user_turn`](Self::submit_user_turn),
/// [`toggle_deep_reasoning`](Self::toggle_deep_reasoning) and
/// [`request_speech`](Self::request_speech).
///
/// All collaborator failures stop here: a failed generation becomes the fixed
/// failure message in the transcript, a failed speech request is logged and
/// dropped.
pub struct OracleSession {
    state: Mutex<SessionState>,
    chat: Arc<dyn ChatModel>,
    speech: Arc<dyn SpeechSynthesizer>,
    // The speaker is acquired on first speech request, not at construction,
    // so embedders can defer device access to a user gesture.
    output: Mutex<Option<Arc<dyn AudioOutput>>>,
    output_factory: OutputFactory,
    events: broadcast::Sender<SessionEvent>,
}

impl OracleSession {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        speech: Arc<dyn SpeechSynthesizer>,
        system_persona: &str,
    ) -> Self {
        Self::with_output_factory(
            chat,
            speech,
            system_persona,
            Box::new(|| {
                let speaker = Speaker::spawn().context("failed to start speaker output")?;
                Ok(Arc::new(speaker) as Arc<dyn AudioOutput>)
            }),
        )
    }

    /// Like [`new`](Self::new), with a custom audio output source. The
    /// factory runs once, on the first speech request.
    pub fn with_output_factory(
        chat: Arc<dyn ChatModel>,
        speech: Arc<dyn SpeechSynthesizer>,
        system_persona: &str,
        output_factory: OutputFactory,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(SessionState {
                transcript: Transcript::seeded(GREETING),
                generation: GenerationState::Idle,
                options: SessionOptions::new(system_persona),
            }),
            chat,
            speech,
            output: Mutex::new(None),
            output_factory,
            events,
        }
    }

    /// Subscribes to change notifications. Redraw from [`snapshot`](Self::snapshot).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        SessionSnapshot {
            transcript: state.transcript.clone(),
            generation: state.generation,
            options: state.options.clone(),
        }
    }

    /// Submits one user turn and drives the streamed reply to completion.
    ///
    /// A submission that trims empty, or that arrives while a generation is
    /// already in flight, is silently ignored. On stream failure the
    /// placeholder turn is overwritten with [`FAILURE_MESSAGE`] and the
    /// session returns to idle; nothing is retried.
    pub async fn submit_user_turn(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("ignoring empty submission");
            return;
        }

        // Admission control: the Idle check and the transition happen under
        // one lock so a second caller can never pass the check concurrently.
        let (request, placeholder) = {
            let mut state = self.lock_state();
            if state.generation != GenerationState::Idle {
                tracing::debug!("generation already in flight, ignoring submission");
                return;
            }
            state.generation = GenerationState::AwaitingResponse;
            state.transcript.push_user(text);
            let deep_reasoning_enabled = state.options.deep_reasoning_enabled();
            let placeholder = state
                .transcript
                .push_assistant_placeholder(deep_reasoning_enabled);

            // The accumulated conversation travels with every request; the
            // empty placeholder itself stays out of it.
            let messages: Vec<ChatMessage> = state.transcript.turns()[..placeholder]
                .iter()
                .map(|turn| ChatMessage::new(turn.role(), turn.content()))
                .collect();
            let request = ChatRequest::builder()
                .with_system_persona(state.options.system_persona())
                .with_deep_reasoning(state.options.deep_reasoning_enabled())
                .with_messages(messages)
                .build();
            (request, placeholder)
        };
        self.notify(SessionEvent::TranscriptChanged);
        self.notify(SessionEvent::GenerationStateChanged(
            GenerationState::AwaitingResponse,
        ));

        if let Err(e) = self.consume_stream(request, placeholder).await {
            tracing::warn!("text generation failed: {:?}", e);
            self.rewrite_turn(placeholder, FAILURE_MESSAGE);
        }

        {
            let mut state = self.lock_state();
            state.generation = GenerationState::Idle;
        }
        self.notify(SessionEvent::GenerationStateChanged(GenerationState::Idle));
    }

    /// Flips deep-reasoning mode for subsequent submissions. An in-flight
    /// request keeps the hint captured when it was submitted.
    pub fn toggle_deep_reasoning(&self) {
        {
            let mut state = self.lock_state();
            state.options.toggle_deep_reasoning();
        }
        self.notify(SessionEvent::OptionsChanged);
    }

    /// Synthesizes `text` and plays it through the shared speaker.
    ///
    /// Speech is supplementary: every failure on this path is logged and
    /// swallowed, and the transcript is never touched. Concurrent requests
    /// are not serialized; their playbacks may overlap.
    pub async fn request_speech(&self, text: &str) {
        if let Err(e) = self.speak(text).await {
            tracing::warn!("speech request failed: {:?}", e);
        }
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let output = self.acquire_output()?;
        if output.is_suspended() {
            output.resume().context("failed to resume audio output")?;
        }

        let payload = self
            .speech
            .synthesize(text)
            .await
            .context("speech synthesis failed")?;
        let samples = decode_pcm16(&payload).context("failed to decode speech payload")?;
        output
            .play(samples, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS)
            .context("speech playback failed")
    }

    async fn consume_stream(&self, request: ChatRequest, placeholder: usize) -> Result<()> {
        let mut events = self
            .chat
            .open_stream(request)
            .await
            .context("failed to open the reply stream")?;

        let mut full_text = String::new();
        while let Some(event) = events.recv().await {
            match event {
                ChatStreamEvent::Fragment(fragment) => {
                    // Fragments are applied in arrival order; the turn is
                    // rewritten with the accumulated text each time.
                    full_text.push_str(&fragment);
                    self.rewrite_turn(placeholder, &full_text);
                }
                ChatStreamEvent::Completed => return Ok(()),
                ChatStreamEvent::Failed(reason) => bail!("reply stream failed: {reason}"),
            }
        }
        // The collaborator went away without a terminal event.
        bail!("reply stream ended without completion")
    }

    fn rewrite_turn(&self, index: usize, content: &str) {
        {
            let mut state = self.lock_state();
            state.transcript.rewrite(index, content);
        }
        self.notify(SessionEvent::TranscriptChanged);
    }

    fn acquire_output(&self) -> Result<Arc<dyn AudioOutput>> {
        let mut slot = match self.output.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(output) = slot.as_ref() {
            return Ok(output.clone());
        }
        let output = (self.output_factory)().context("failed to acquire audio output")?;
        *slot = Some(output.clone());
        Ok(output)
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            // State mutations are single assignments, so the state behind a
            // poisoned lock is still consistent.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn notify(&self, event: SessionEvent) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MockChatModel;
    use crate::speech::{MockAudioOutput, MockSpeechSynthesizer};
    use base64::Engine;
    use mockall::predicate::eq;
    use oracle_chat_types::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    fn no_output_factory() -> OutputFactory {
        Box::new(|| panic!("audio output should not be acquired in this test"))
    }

    fn session_with_chat(chat: MockChatModel) -> OracleSession {
        OracleSession::with_output_factory(
            Arc::new(chat),
            Arc::new(MockSpeechSynthesizer::new()),
            "test persona",
            no_output_factory(),
        )
    }

    fn session_with_speech(
        speech: MockSpeechSynthesizer,
        output_factory: OutputFactory,
    ) -> OracleSession {
        OracleSession::with_output_factory(
            Arc::new(MockChatModel::new()),
            Arc::new(speech),
            "test persona",
            output_factory,
        )
    }

    /// A channel pre-loaded with the given events, as a well-behaved chat
    /// collaborator would deliver them.
    fn scripted_stream(events: Vec<ChatStreamEvent>) -> mpsc::Receiver<ChatStreamEvent> {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.try_send(event).expect("stream script fits the channel");
        }
        rx
    }

    fn encode_pcm16(samples: &[i16]) -> String {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[tokio::test]
    async fn fresh_session_holds_only_the_greeting() {
        let session = session_with_chat(MockChatModel::new());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, GenerationState::Idle);
        assert_eq!(snapshot.transcript.len(), 1);
        let turn = snapshot.transcript.last().unwrap();
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.content(), GREETING);
    }

    #[tokio::test]
    async fn blank_submission_is_a_no_op() {
        // The mock has no expectations, so any call to it fails the test.
        let session = session_with_chat(MockChatModel::new());
        session.submit_user_turn("   ").await;
        assert_eq!(session.snapshot().transcript.len(), 1);
        assert_eq!(session.snapshot().generation, GenerationState::Idle);
    }

    #[tokio::test]
    async fn fragments_accumulate_into_the_placeholder_in_order() {
        let mut chat = MockChatModel::new();
        chat.expect_open_stream().times(1).return_once(|_| {
            Ok(scripted_stream(vec![
                ChatStreamEvent::Fragment("Hel".to_string()),
                ChatStreamEvent::Fragment("lo".to_string()),
                ChatStreamEvent::Fragment(" world".to_string()),
                ChatStreamEvent::Completed,
            ]))
        });
        let session = session_with_chat(chat);

        session.submit_user_turn("hi").await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, GenerationState::Idle);
        assert_eq!(snapshot.transcript.len(), 3);
        assert_eq!(snapshot.transcript.turns()[1].role(), Role::User);
        assert_eq!(snapshot.transcript.turns()[1].content(), "hi");
        assert_eq!(snapshot.transcript.turns()[2].role(), Role::Assistant);
        assert_eq!(snapshot.transcript.turns()[2].content(), "Hello world");
    }

    #[tokio::test]
    async fn request_carries_persona_and_accumulated_conversation() {
        let mut chat = MockChatModel::new();
        chat.expect_open_stream()
            .withf(|request| {
                let texts: Vec<&str> =
                    request.messages().iter().map(|m| m.text()).collect();
                request.system_persona() == "test persona"
                    && !request.deep_reasoning()
                    && texts == vec![GREETING, "hi"]
            })
            .times(1)
            .return_once(|_| Ok(scripted_stream(vec![ChatStreamEvent::Completed])));
        let session = session_with_chat(chat);

        session.submit_user_turn("hi").await;
    }

    #[tokio::test]
    async fn stream_failure_overwrites_partial_content_with_fixed_message() {
        let mut chat = MockChatModel::new();
        chat.expect_open_stream().times(1).return_once(|_| {
            Ok(scripted_stream(vec![
                ChatStreamEvent::Fragment("Hel".to_string()),
                ChatStreamEvent::Failed("connection reset".to_string()),
            ]))
        });
        let session = session_with_chat(chat);

        session.submit_user_turn("hi").await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, GenerationState::Idle);
        assert_eq!(snapshot.transcript.last().unwrap().content(), FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn failure_to_open_the_stream_is_surfaced_the_same_way() {
        let mut chat = MockChatModel::new();
        chat.expect_open_stream()
            .times(1)
            .return_once(|_| Err(anyhow::anyhow!("dns lookup failed")));
        let session = session_with_chat(chat);

        session.submit_user_turn("hi").await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, GenerationState::Idle);
        assert_eq!(snapshot.transcript.last().unwrap().content(), FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn resubmission_while_awaiting_response_is_rejected() {
        // --- 1. Arrange ---
        // A stream the test holds open until the second submission has been
        // attempted.
        let (tx, rx) = mpsc::channel(4);
        let mut chat = MockChatModel::new();
        chat.expect_open_stream().times(1).return_once(move |_| Ok(rx));
        let session = Arc::new(session_with_chat(chat));

        // --- 2. Act ---
        let submitter = session.clone();
        let first = tokio::spawn(async move { submitter.submit_user_turn("first").await });
        while session.snapshot().generation != GenerationState::AwaitingResponse {
            tokio::task::yield_now().await;
        }

        session.submit_user_turn("second").await;

        tx.send(ChatStreamEvent::Fragment("ok".to_string()))
            .await
            .unwrap();
        tx.send(ChatStreamEvent::Completed).await.unwrap();
        first.await.unwrap();

        // --- 3. Assert ---
        // Only the first submission reached the transcript: greeting, one
        // user turn, one assistant turn.
        let snapshot = session.snapshot();
        assert_eq!(snapshot.transcript.len(), 3);
        assert_eq!(snapshot.transcript.turns()[1].content(), "first");
        assert_eq!(snapshot.transcript.turns()[2].content(), "ok");
        assert_eq!(snapshot.generation, GenerationState::Idle);
    }

    #[tokio::test]
    async fn toggling_deep_reasoning_never_rewrites_recorded_turns() {
        let mut chat = MockChatModel::new();
        let mut seq = mockall::Sequence::new();
        chat.expect_open_stream()
            .withf(|request| !request.deep_reasoning())
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(scripted_stream(vec![ChatStreamEvent::Completed])));
        chat.expect_open_stream()
            .withf(|request| request.deep_reasoning())
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(scripted_stream(vec![ChatStreamEvent::Completed])));
        let session = session_with_chat(chat);

        session.submit_user_turn("plain question").await;
        session.toggle_deep_reasoning();
        session.submit_user_turn("deep question").await;

        let snapshot = session.snapshot();
        // The first assistant turn was recorded without the flag and the
        // toggle did not change it retroactively.
        assert!(!snapshot.transcript.turns()[2].deep_reasoning_requested());
        assert!(snapshot.transcript.turns()[4].deep_reasoning_requested());
    }

    #[tokio::test]
    async fn speech_resumes_a_suspended_output_and_plays_decoded_samples() {
        let mut speech = MockSpeechSynthesizer::new();
        let payload = encode_pcm16(&[0, 16384, -16384, 32767]);
        speech
            .expect_synthesize()
            .with(eq("read this"))
            .times(1)
            .return_once(move |_| Ok(payload));

        let mut output = MockAudioOutput::new();
        output.expect_is_suspended().times(1).return_const(true);
        output.expect_resume().times(1).returning(|| Ok(()));
        output
            .expect_play()
            .withf(|samples, sample_rate, channels| {
                samples == &[0.0, 0.5, -0.5, 32767.0 / 32768.0]
                    && *sample_rate == 24_000
                    && *channels == 1
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let output = Arc::new(output);
        let factory: OutputFactory =
            Box::new(move || Ok(output.clone() as Arc<dyn AudioOutput>));
        let session = session_with_speech(speech, factory);

        session.request_speech("read this").await;
    }

    #[tokio::test]
    async fn output_is_acquired_once_and_reused() {
        let mut speech = MockSpeechSynthesizer::new();
        speech
            .expect_synthesize()
            .times(2)
            .returning(|_| Ok(encode_pcm16(&[0, 0])));

        let mut output = MockAudioOutput::new();
        output.expect_is_suspended().return_const(false);
        output.expect_play().times(2).returning(|_, _, _| Ok(()));
        let output = Arc::new(output);

        let acquisitions = Arc::new(AtomicUsize::new(0));
        let counter = acquisitions.clone();
        let factory: OutputFactory = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(output.clone() as Arc<dyn AudioOutput>)
        });
        let session = session_with_speech(speech, factory);

        session.request_speech("one").await;
        session.request_speech("two").await;

        assert_eq!(acquisitions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn synthesis_failure_is_swallowed_and_leaves_the_transcript_alone() {
        let mut speech = MockSpeechSynthesizer::new();
        speech
            .expect_synthesize()
            .times(1)
            .return_once(|_| Err(anyhow::anyhow!("quota exceeded")));

        let mut output = MockAudioOutput::new();
        output.expect_is_suspended().return_const(false);
        // No play expectation: playback must not be attempted.
        let output = Arc::new(output);
        let factory: OutputFactory =
            Box::new(move || Ok(output.clone() as Arc<dyn AudioOutput>));
        let session = session_with_speech(speech, factory);

        let before = session.snapshot();
        session.request_speech("anything").await;
        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test]
    async fn empty_text_still_reaches_the_synthesizer() {
        let mut speech = MockSpeechSynthesizer::new();
        speech
            .expect_synthesize()
            .with(eq(""))
            .times(1)
            .returning(|_| Ok(encode_pcm16(&[])));

        let mut output = MockAudioOutput::new();
        output.expect_is_suspended().return_const(false);
        output.expect_play().times(1).returning(|_, _, _| Ok(()));
        let output = Arc::new(output);
        let factory: OutputFactory =
            Box::new(move || Ok(output.clone() as Arc<dyn AudioOutput>));
        let session = session_with_speech(speech, factory);

        session.request_speech("").await;
    }

    #[tokio::test]
    async fn subscribers_see_state_transitions_around_a_generation() {
        let mut chat = MockChatModel::new();
        chat.expect_open_stream().times(1).return_once(|_| {
            Ok(scripted_stream(vec![
                ChatStreamEvent::Fragment("done".to_string()),
                ChatStreamEvent::Completed,
            ]))
        });
        let session = session_with_chat(chat);
        let mut events = session.subscribe();

        session.submit_user_turn("hi").await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.contains(&SessionEvent::GenerationStateChanged(
            GenerationState::AwaitingResponse
        )));
        assert!(seen.contains(&SessionEvent::GenerationStateChanged(GenerationState::Idle)));
        assert!(seen.contains(&SessionEvent::TranscriptChanged));
    }
}
