//! Audio conditioning: sample rate conversion and 16-bit PCM encoding.

mod pcm;
mod resample;

use bytes::Bytes;
use thiserror::Error;

pub use pcm::{pcm_encode, quantize};
pub use resample::resample;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),
}

/// Converts capture chunks at the device rate into PCM at the stream rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioPipeline {
    input_rate: u32,
    output_rate: u32,
}

impl AudioPipeline {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self, AudioError> {
        if input_rate == 0 {
            return Err(AudioError::InvalidSampleRate(input_rate));
        }
        if output_rate == 0 {
            return Err(AudioError::InvalidSampleRate(output_rate));
        }
        Ok(Self {
            input_rate,
            output_rate,
        })
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Resample then encode one chunk.
    pub fn process(&self, chunk: &[f32]) -> Result<Bytes, AudioError> {
        let resampled = resample(chunk, self.input_rate, self.output_rate)?;
        Ok(pcm_encode(&resampled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_output_size() {
        let pipeline = AudioPipeline::new(48_000, 16_000).unwrap();
        let pcm = pipeline.process(&vec![0.25; 4800]).unwrap();
        // 100 ms at 16 kHz, two bytes per sample.
        assert_eq!(pcm.len(), 3200);
    }

    #[test]
    fn test_pipeline_rejects_zero_rate() {
        assert_eq!(
            AudioPipeline::new(0, 16_000),
            Err(AudioError::InvalidSampleRate(0))
        );
    }
}
