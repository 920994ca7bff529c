use anyhow::{Context, Result};
use clap::Parser;
use oracle_chat::config::Config;
use oracle_chat::gemini::{GeminiChat, GeminiSpeech};
use oracle_chat::persona;
use oracle_chat::session::OracleSession;
use oracle_chat::types::{Role, SessionEvent};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
struct Cli {
    /// Directory holding an optional persona.md override
    #[arg(long)]
    persona_dir: Option<PathBuf>,
}

/// Prints assistant content incrementally as the transcript changes.
///
/// Tracks how much of the latest turn has been printed so each notification
/// only emits the newly streamed tail.
async fn print_updates(
    session: Arc<OracleSession>,
    mut events: tokio::sync::broadcast::Receiver<SessionEvent>,
) {
    let mut turn_count = 0usize;
    let mut printed = 0usize;
    loop {
        match events.recv().await {
            Ok(SessionEvent::TranscriptChanged) => {}
            Ok(_) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("presentation lagged by {} events", n);
                continue;
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }

        let snapshot = session.snapshot();
        if snapshot.transcript.len() != turn_count {
            turn_count = snapshot.transcript.len();
            printed = 0;
        }
        let Some(turn) = snapshot.transcript.last() else {
            continue;
        };
        if turn.role() != Role::Assistant || turn.content().is_empty() {
            continue;
        }

        let content = turn.content();
        if printed == 0 {
            print!("oracle> ");
        }
        if printed <= content.len() && content.is_char_boundary(printed) {
            print!("{}", &content[printed..]);
        } else {
            // Content was replaced rather than extended (a failure message).
            print!("\noracle> {}", content);
        }
        printed = content.len();
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let args = Cli::parse();
    let persona = match &args.persona_dir {
        Some(dir) => persona::load_persona(dir).context("Failed to load persona")?,
        None => persona::DEFAULT_PERSONA.to_string(),
    };

    let chat = Arc::new(GeminiChat::new(
        config.gemini_api_key().clone(),
        config.chat_model(),
    ));
    let speech = Arc::new(GeminiSpeech::new(
        config.gemini_api_key().clone(),
        config.tts_model(),
        config.voice().clone(),
    ));
    let session = Arc::new(OracleSession::new(chat, speech, &persona));

    println!("/think toggles deep reasoning, /speak reads the last reply aloud, /quit exits.");
    if let Some(greeting) = session.snapshot().transcript.last() {
        println!("oracle> {}", greeting.content());
    }

    tokio::spawn(print_updates(session.clone(), session.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        let _ = std::io::stdout().flush();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => {}
            "/quit" => break,
            "/think" => {
                session.toggle_deep_reasoning();
                let enabled = session.snapshot().options.deep_reasoning_enabled();
                println!(
                    "deep reasoning {}",
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            "/speak" => {
                let snapshot = session.snapshot();
                let last_reply = snapshot
                    .transcript
                    .turns()
                    .iter()
                    .rev()
                    .find(|turn| turn.role() == Role::Assistant)
                    .map(|turn| turn.content().to_string());
                match last_reply {
                    Some(text) => session.request_speech(&text).await,
                    None => println!("nothing to read yet"),
                }
            }
            text => {
                session.submit_user_turn(text).await;
                // Give the printer a moment to drain the tail of the stream.
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                println!();
            }
        }
    }

    Ok(())
}
