//! WAV file playback as a capture source.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hound::{SampleFormat, WavReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::session::{CaptureSource, EventSender, SessionEvent};
use crate::errors::{StreamError, StreamResult};

/// Chunk length used when none is configured.
pub const DEFAULT_CHUNK_DURATION: Duration = Duration::from_millis(100);

/// Read a WAV file as mono `f32` samples, averaging channels.
///
/// Returns the samples and the file's sample rate.
pub fn load_wav_mono(path: impl AsRef<Path>) -> StreamResult<(Vec<f32>, u32)> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)
        .map_err(|e| StreamError::Capture(format!("Cannot open {}: {e}", path.display())))?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(StreamError::Capture(format!(
            "{} has no audio channels",
            path.display()
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<_>>(),
        SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<hound::Result<_>>()
        }
    }
    .map_err(|e| StreamError::Capture(format!("Cannot read {}: {e}", path.display())))?;

    let channels = spec.channels as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    debug!(
        "Loaded {}: {} Hz, {} channel(s), {} frames",
        path.display(),
        spec.sample_rate,
        spec.channels,
        samples.len()
    );
    Ok((samples, spec.sample_rate))
}

/// Plays a WAV file into a session in fixed-length chunks.
///
/// In real-time mode each chunk is followed by a pause of the chunk's duration,
/// like a live microphone. When the file runs out the source posts `Stop`.
#[derive(Debug)]
pub struct WavFileCapture {
    path: PathBuf,
    chunk_duration: Duration,
    realtime: bool,
    cancel: CancellationToken,
}

impl WavFileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_duration: DEFAULT_CHUNK_DURATION,
            realtime: true,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_chunk_duration(mut self, chunk_duration: Duration) -> Self {
        self.chunk_duration = chunk_duration;
        self
    }

    /// Disable pacing and post every chunk immediately.
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }
}

impl CaptureSource for WavFileCapture {
    fn start(&mut self, events: EventSender) -> StreamResult<()> {
        let (samples, sample_rate) = load_wav_mono(&self.path)?;

        let frames_per_chunk =
            ((sample_rate as u128 * self.chunk_duration.as_millis()) / 1000).max(1) as usize;
        let chunk_duration = self.chunk_duration;
        let realtime = self.realtime;
        let cancel = self.cancel.clone();

        info!(
            "Streaming {} ({} Hz, {:.1} s)",
            self.path.display(),
            sample_rate,
            samples.len() as f64 / sample_rate.max(1) as f64
        );

        tokio::spawn(async move {
            if events
                .send(SessionEvent::CaptureFormat { sample_rate })
                .is_err()
            {
                return;
            }

            for chunk in samples.chunks(frames_per_chunk) {
                if cancel.is_cancelled() {
                    return;
                }
                if events
                    .send(SessionEvent::CaptureChunk(chunk.to_vec()))
                    .is_err()
                {
                    return;
                }
                if realtime {
                    tokio::select! {
                        _ = tokio::time::sleep(chunk_duration) => {}
                        _ = cancel.cancelled() => return,
                    }
                }
            }

            debug!("End of WAV file");
            let _ = events.send(SessionEvent::Stop);
        });

        Ok(())
    }

    fn stop(&mut self) {
        self.cancel.cancel();
    }
}
