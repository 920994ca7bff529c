use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use oracle_chat_types::Base64EncodedAudioBytes;
use oracle_chat_utils::playback::Speaker;

/// The speech-synthesis collaborator.
///
/// The voice profile is fixed at construction; callers only supply text.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns the synthesized speech for `text` as base64-encoded PCM16,
    /// single channel at 24 kHz.
    async fn synthesize(&self, text: &str) -> Result<Base64EncodedAudioBytes>;
}

/// The audio output collaborator: playback of raw sample buffers plus a
/// power state that must be resumed before first use.
#[cfg_attr(test, automock)]
pub trait AudioOutput: Send + Sync {
    fn is_suspended(&self) -> bool;

    fn resume(&self) -> Result<()>;

    /// Starts playback of `samples` and returns without waiting for it to
    /// finish. Concurrent playbacks overlap.
    fn play(&self, samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<()>;
}

impl AudioOutput for Speaker {
    fn is_suspended(&self) -> bool {
        Speaker::is_suspended(self)
    }

    fn resume(&self) -> Result<()> {
        Speaker::resume(self);
        Ok(())
    }

    fn play(&self, samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<()> {
        Speaker::play(self, samples, sample_rate, channels)
    }
}
