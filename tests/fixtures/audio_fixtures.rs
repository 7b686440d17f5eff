//! Audio Test Fixtures
//!
//! Programmatically generated audio, so tests need no files on disk beyond
//! the temporary WAVs they write themselves.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

/// Standard sample rate for the fixtures (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

/// Duration constants (in samples at 16kHz)
pub const MS_100: usize = 1600;
pub const SECOND: usize = 16000;

/// Generate silence
pub fn generate_silence(duration_samples: usize) -> Vec<f32> {
    vec![0.0; duration_samples]
}

/// Generate a sine tone with the given frequency and amplitude (0.0 - 1.0)
pub fn generate_sine(
    duration_samples: usize,
    frequency: f32,
    sample_rate: u32,
    amplitude: f32,
) -> Vec<f32> {
    (0..duration_samples)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Write mono 16-bit PCM samples to `dir/name`.
pub fn write_wav_i16(dir: &Path, name: &str, samples: &[f32], sample_rate: u32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
    path
}
