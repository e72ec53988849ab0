//! Binary FSK waveform synthesis and the windowed tone discriminant used on
//! the receive side.
//!
//! Each bit occupies one fixed-length block of samples carrying a single
//! sine tone: `freq0` for a zero, `freq1` for a one. The phase restarts at
//! zero on every bit boundary, so the demodulator measures tone energy with
//! complex correlation rather than assuming phase continuity.

use std::f32::consts::PI;

use num_complex::Complex32;

use crate::config::ModemConfig;

/// Windows shorter than this stay flat instead of edge-tapered.
const MIN_TAPERED_WINDOW: usize = 16;

/// Edge taper length as a fraction of the analysis window (1/8 per side).
const EDGE_TAPER_DIVISOR: usize = 8;

/// Smallest edge taper once a window is tapered at all.
const MIN_TAPER_SAMPLES: usize = 2;

/// Synthesizes the waveform for a bit sequence.
///
/// The output holds exactly `bits.len() * config.samples_per_bit()` samples
/// in the `[-amplitude, amplitude]` range.
pub fn modulate(bits: &[bool], config: &ModemConfig) -> Vec<f32> {
    let samples_per_bit = config.samples_per_bit();
    let sample_rate = config.sample_rate as f32;
    let mut waveform = Vec::with_capacity(bits.len() * samples_per_bit);
    for &bit in bits {
        let freq = if bit { config.freq1 } else { config.freq0 };
        let step = 2.0 * PI * freq / sample_rate;
        for n in 0..samples_per_bit {
            waveform.push(config.amplitude * (step * n as f32).sin());
        }
    }
    waveform
}

/// Precomputed analysis window for one bit period: a raised-cosine edge
/// taper plus one complex reference oscillator per tone.
///
/// The discriminant it produces is phase-blind (magnitude of a complex
/// correlation), which is what makes bit-boundary phase restarts and
/// unknown capture offsets survivable.
pub struct SymbolKernel {
    window: Vec<f32>,
    osc0: Vec<Complex32>,
    osc1: Vec<Complex32>,
}

impl SymbolKernel {
    pub fn new(window_len: usize, freq0: f32, freq1: f32, sample_rate: u32) -> Self {
        Self {
            window: symbol_window(window_len),
            osc0: reference_oscillator(freq0, window_len, sample_rate),
            osc1: reference_oscillator(freq1, window_len, sample_rate),
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Signed tone score for one window of samples: positive when the
    /// one-tone dominates, negative for the zero-tone, zero for silence.
    ///
    /// `segment` holds at most `len()` samples. A shorter segment is scored
    /// over the leading part of the window, so a bit cut off by the end of
    /// a capture still produces a usable score.
    pub fn discriminant(&self, segment: &[f32]) -> f32 {
        debug_assert!(segment.len() <= self.window.len());
        let mut corr0 = Complex32::new(0.0, 0.0);
        let mut corr1 = Complex32::new(0.0, 0.0);
        for (((&sample, &weight), &ref0), &ref1) in segment
            .iter()
            .zip(&self.window)
            .zip(&self.osc0)
            .zip(&self.osc1)
        {
            let value = sample * weight;
            corr0 += ref0 * value;
            corr1 += ref1 * value;
        }
        corr1.norm() - corr0.norm()
    }
}

/// Raised-cosine window: sine-squared ramps over `taper_len` samples on each
/// edge, flat in the middle.
fn raised_cosine_window(len: usize, taper_len: usize) -> Vec<f32> {
    let mut window = vec![1.0f32; len];
    let taper_len = taper_len.min(len / 2);
    for i in 0..taper_len {
        let ramp = (PI / 2.0 * i as f32 / taper_len as f32).sin();
        let gain = ramp * ramp;
        window[i] = gain;
        window[len - 1 - i] = gain;
    }
    window
}

fn symbol_window(len: usize) -> Vec<f32> {
    if len < MIN_TAPERED_WINDOW {
        return vec![1.0f32; len];
    }
    let taper = (len / EDGE_TAPER_DIVISOR).max(MIN_TAPER_SAMPLES);
    raised_cosine_window(len, taper)
}

/// Unit-magnitude oscillator at `-freq`, so multiplying by a real signal and
/// summing yields the complex correlation against that tone.
fn reference_oscillator(freq: f32, len: usize, sample_rate: u32) -> Vec<Complex32> {
    let step = -2.0 * PI * freq / sample_rate as f32;
    (0..len)
        .map(|n| {
            let angle = step * n as f32;
            Complex32::new(angle.cos(), angle.sin())
        })
        .collect()
}
