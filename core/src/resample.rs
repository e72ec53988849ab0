//! Capture conditioning helpers: channel folding and sample-rate conversion.
//!
//! The codec itself never touches audio I/O; callers use these to bring a
//! stereo or mismatched-rate capture onto the configured mono rate before
//! decoding. Linear interpolation is sufficient because the tones sit far
//! below the Nyquist limit of every rate worth configuring.

/// Mixes interleaved stereo down to mono by averaging each L/R pair.
///
/// # Panics
/// If `samples` does not hold an even number of values.
pub fn stereo_to_mono(samples: &[f32]) -> Vec<f32> {
    assert!(
        samples.len() % 2 == 0,
        "stereo audio must hold left/right pairs"
    );
    samples
        .chunks(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}

/// Resamples `samples` from `from_rate` to `to_rate` by linear
/// interpolation. Identical rates return the input unchanged.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f32 / from_rate as f32;
    let new_length = ((samples.len() as f32) * ratio).ceil() as usize;
    let mut resampled = Vec::with_capacity(new_length);
    for index in 0..new_length {
        let source = index as f32 / ratio;
        let base = (source.floor() as usize).min(samples.len() - 1);
        let fraction = source - base as f32;
        let next = base + 1;
        let value = if next < samples.len() {
            samples[base] * (1.0 - fraction) + samples[next] * fraction
        } else {
            samples[base]
        };
        resampled.push(value);
    }
    resampled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_to_mono_averages_pairs() {
        let stereo = vec![0.2, 0.8, 0.5, 0.7, -0.2, -0.4];
        let mono = stereo_to_mono(&stereo);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.5).abs() < 1e-6);
        assert!((mono[1] - 0.6).abs() < 1e-6);
        assert!((mono[2] + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample(&samples, 48_000, 48_000), samples);
        assert!(resample(&[], 44_100, 48_000).is_empty());
    }

    #[test]
    fn test_resample_scales_length_by_rate_ratio() {
        let samples = vec![0.0f32; 4800];
        let down = resample(&samples, 48_000, 16_000);
        assert!((down.len() as i64 - 1600).abs() <= 1);
        let up = resample(&samples, 16_000, 48_000);
        assert!((up.len() as i64 - 14_400).abs() <= 1);
    }

    #[test]
    fn test_resample_interpolates_between_neighbors() {
        let samples = vec![0.0, 1.0];
        let up = resample(&samples, 1, 4);
        assert_eq!(up.len(), 8);
        assert!((up[0] - 0.0).abs() < 1e-6);
        assert!((up[2] - 0.5).abs() < 1e-6);
        // Past the last source sample the tail holds it.
        assert!((up[7] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_preserves_value_range() {
        let samples: Vec<f32> = (0..500).map(|n| (0.21 * n as f32).sin()).collect();
        for sample in resample(&samples, 48_000, 44_100) {
            assert!((-1.001..=1.001).contains(&sample));
        }
    }

    #[test]
    fn test_small_stretch_keeps_tone_shape() {
        // A 1.5 percent stretch must keep the waveform locally similar;
        // the decoder's drift sweep depends on that.
        let tone: Vec<f32> = (0..1600)
            .map(|n| (2.0 * std::f32::consts::PI * 1_500.0 * n as f32 / 48_000.0).sin())
            .collect();
        let stretched = resample(&tone, 48_720, 48_000);
        assert!((stretched.len() as i64 - 1576).abs() <= 1);
        assert!(stretched.iter().all(|s| s.abs() <= 1.001));
    }
}
