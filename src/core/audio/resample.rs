use super::AudioError;

/// Linear-interpolation sample rate conversion.
///
/// Output holds `round(len * output_rate / input_rate)` samples. Output sample
/// `i` reads the source at `i * input_rate / output_rate`, reusing the last
/// sample past the end. There is no low-pass stage, so downsampling aliases
/// content above the new Nyquist frequency.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>, AudioError> {
    if input_rate == 0 {
        return Err(AudioError::InvalidSampleRate(input_rate));
    }
    if output_rate == 0 {
        return Err(AudioError::InvalidSampleRate(output_rate));
    }

    if input_rate == output_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    let ratio = input_rate as f64 / output_rate as f64;
    let new_len = (input.len() as f64 * output_rate as f64 / input_rate as f64).round() as usize;
    let last = input.len() - 1;

    let mut resampled = Vec::with_capacity(new_len);
    for i in 0..new_len {
        let src_idx = i as f64 * ratio;
        let idx0 = (src_idx.floor() as usize).min(last);
        let idx1 = (idx0 + 1).min(last);
        let frac = src_idx - src_idx.floor();

        let sample = input[idx0] as f64 * (1.0 - frac) + input[idx1] as f64 * frac;
        resampled.push(sample as f32);
    }

    Ok(resampled)
}
