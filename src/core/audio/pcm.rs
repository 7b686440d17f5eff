use bytes::{BufMut, Bytes, BytesMut};

/// Convert one float sample to a signed 16-bit value.
///
/// Input is clamped to [-1.0, 1.0] and NaN maps to silence. Negative values
/// scale by 32768 and the rest by 32767, so both full-scale ends are reachable.
pub fn quantize(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }

    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    scaled
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Encode samples as 16-bit signed little-endian PCM.
pub fn pcm_encode(samples: &[f32]) -> Bytes {
    let mut out = BytesMut::with_capacity(samples.len() * 2);
    for &sample in samples {
        out.put_i16_le(quantize(sample));
    }
    out.freeze()
}
