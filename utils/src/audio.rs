use anyhow::{bail, Context};
use base64::Engine;

/// Sample rate of synthesized speech payloads.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Synthesized speech payloads are single channel.
pub const SPEECH_CHANNELS: u16 = 1;

/// Decodes a base64 payload of little-endian 16-bit signed PCM into
/// normalized f32 samples.
///
/// Each sample is divided by 32768.0, giving the range [-1.0, 1.0). A payload
/// with an odd byte count cannot be a PCM16 stream and is rejected rather
/// than truncated.
pub fn decode_pcm16(payload: &str) -> anyhow::Result<Vec<f32>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("speech payload is not valid base64")?;

    if bytes.len() % 2 != 0 {
        bail!(
            "speech payload has odd byte count ({}), not PCM16",
            bytes.len()
        );
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|chunk| {
            let v = i16::from_le_bytes([chunk[0], chunk[1]]);
            v as f32 / 32768.0
        })
        .collect();
    Ok(samples)
}
