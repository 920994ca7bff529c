use anyhow::{anyhow, bail, Context};
use rodio::buffer::SamplesBuffer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

/// A sample buffer queued for playback.
#[derive(Debug)]
struct PlaybackJob {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

/// Speaker output backed by a dedicated thread that owns the OS audio stream.
///
/// The stream handle is not Send, so a worker thread holds it for the life of
/// the speaker and receives buffers over a channel. The `Speaker` handle
/// itself is Send + Sync and can be shared across tasks.
///
/// A speaker starts suspended and must be resumed before the first playback,
/// mirroring platform policies that gate audio output on a user gesture.
/// Each submitted buffer becomes an independent source mixed into the shared
/// stream, so concurrent playbacks overlap rather than queue.
pub struct Speaker {
    tx: mpsc::Sender<PlaybackJob>,
    suspended: AtomicBool,
}

impl Speaker {
    /// Starts the playback thread and opens the default output device.
    pub fn spawn() -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel::<PlaybackJob>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        std::thread::Builder::new()
            .name("oracle-speaker".to_string())
            .spawn(move || {
                // The stream must stay alive for playback to continue, so it
                // lives on this thread's stack until the channel closes.
                let (_stream, handle) = match rodio::OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = ready_tx.send(Ok(()));
                        pair
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };

                while let Ok(job) = rx.recv() {
                    let buffer =
                        SamplesBuffer::new(job.channels, job.sample_rate, job.samples);
                    if let Err(e) = handle.play_raw(buffer) {
                        tracing::error!("failed to start playback: {}", e);
                    }
                }
                tracing::debug!("speaker thread shutting down");
            })
            .context("failed to spawn speaker thread")?;

        ready_rx
            .recv()
            .context("speaker thread exited before reporting readiness")?
            .map_err(|e| anyhow!("failed to open audio output: {}", e))?;

        Ok(Self {
            tx,
            suspended: AtomicBool::new(true),
        })
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Marks the speaker active. Required once before the first playback.
    pub fn resume(&self) {
        self.suspended.store(false, Ordering::Release);
    }

    /// Hands a buffer to the playback thread. Returns once the buffer is
    /// queued; playback proceeds in the background and may overlap with
    /// other buffers.
    pub fn play(&self, samples: Vec<f32>, sample_rate: u32, channels: u16) -> anyhow::Result<()> {
        if self.is_suspended() {
            bail!("speaker is suspended; resume it before playback");
        }
        self.tx
            .send(PlaybackJob {
                samples,
                sample_rate,
                channels,
            })
            .map_err(|_| anyhow!("speaker thread is gone"))
    }
}
