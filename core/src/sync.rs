//! Preamble search and bit recovery for captured audio.
//!
//! A capture arrives with unknown lead-in, unknown gain and a sample rate
//! that may drift slightly from the transmitter's clock. Synchronization
//! answers all three at once: the buffer is gain-normalized, a small family
//! of plausible bit lengths is swept, and each (offset, bit length) pair is
//! scored by correlating windowed tone discriminants against the expected
//! preamble pattern. That pattern score flattens for offsets within a
//! fraction of a bit of the true start, so a refined pass rescans the
//! coarse winner's neighborhood sample by sample, weighting each offset by
//! how much of the captured energy the expected preamble waveform itself
//! explains. The best-scoring alignment drives demodulation.

use std::f32::consts::PI;

use log::debug;

use crate::bfsk::SymbolKernel;
use crate::config::ModemConfig;

/// Denominator guard for correlation scores; anything below this counts as
/// a zero-energy segment and produces no score.
const MIN_NORM: f32 = 1e-10;

/// Tuning knobs for the synchronizing search. The defaults hold for voice
/// band tones around 300 bit/s; they are exposed so tests and unusual
/// deployments can tighten or relax the search. The refined scan around the
/// coarse winner always runs at single-sample stride.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncParams {
    /// RMS level the gain normalizer aims for.
    pub target_rms: f32,
    /// Gain clamp applied in both directions, so near-silence is never
    /// amplified into garbage.
    pub max_gain: f32,
    /// Buffers with RMS below this are left untouched.
    pub min_rms: f32,
    /// Minimum preamble correlation score a decode will accept.
    pub min_score: f32,
    /// Half-width of the bit-length sweep as a fraction of the nominal
    /// length (0.02 scans plus and minus two percent).
    pub sweep_fraction: f32,
    /// Sweep steps on each side of the nominal bit length.
    pub sweep_steps: usize,
    /// Smallest analysis window the sweep may produce, in samples.
    pub min_window: usize,
    /// Coarse scan stride is the window length divided by this, floored at
    /// one sample. A zero divisor behaves as one.
    pub coarse_divisor: usize,
}

impl Default for SyncParams {
    fn default() -> Self {
        Self {
            target_rms: 0.5,
            max_gain: 20.0,
            min_rms: 1e-4,
            min_score: 0.5,
            sweep_fraction: 0.02,
            sweep_steps: 8,
            min_window: 8,
            coarse_divisor: 4,
        }
    }
}

/// Best preamble alignment found in a capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncResult {
    /// Sample offset of the first preamble bit.
    pub start: usize,
    /// Resolved bit length in samples. Fractional, so long frames do not
    /// accumulate rounding drift when the capture clock runs fast or slow.
    pub samples_per_bit: f32,
    /// Alignment score in `[-1, 1]`: the preamble pattern correlation of
    /// the windowed discriminants, scaled at the refined stage by the share
    /// of captured energy matching the expected preamble waveform.
    pub score: f32,
}

/// Returns a gain-normalized copy of `samples`.
///
/// The input is never modified. Buffers quieter than `min_rms` come back
/// unscaled, and the applied gain is clamped to `[1/max_gain, max_gain]`.
pub fn normalize_gain(samples: &[f32], params: &SyncParams) -> Vec<f32> {
    let mut buffer = samples.to_vec();
    if buffer.is_empty() {
        return buffer;
    }
    let rms = (buffer.iter().map(|&s| s * s).sum::<f32>() / buffer.len() as f32).sqrt();
    if rms < params.min_rms {
        return buffer;
    }
    let gain = (params.target_rms / rms).clamp(1.0 / params.max_gain, params.max_gain);
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
    buffer
}

/// Candidate bit lengths around `nominal`, ascending, deduplicated, floored
/// at the minimum window size.
pub fn candidate_bit_lengths(nominal: f32, params: &SyncParams) -> Vec<f32> {
    let steps = params.sweep_steps as i32;
    let mut candidates = Vec::with_capacity(params.sweep_steps * 2 + 1);
    for step in -steps..=steps {
        let scale = 1.0 + params.sweep_fraction * step as f32 / steps.max(1) as f32;
        let length = (nominal * scale).max(params.min_window as f32);
        if candidates.last().map_or(true, |&last| length > last) {
            candidates.push(length);
        }
    }
    candidates
}

/// Searches `samples` for the configured preamble and returns the best
/// alignment found, or `None` when no alignment could be scored at all
/// (buffer too short, or zero energy everywhere).
///
/// The returned score is not checked against `min_score` here; callers get
/// the best candidate even when it is poor, so a failed decode can still
/// report how close the nearest alignment came.
///
/// The search is deterministic: bit lengths are tried in ascending order,
/// refined offsets in ascending order, and a later alignment replaces an
/// earlier one only on a strictly greater score.
pub fn find_preamble(
    samples: &[f32],
    config: &ModemConfig,
    params: &SyncParams,
) -> Option<SyncResult> {
    let preamble = config.preamble_bits();
    if preamble.is_empty() {
        return None;
    }
    let pattern: Vec<f32> = preamble
        .iter()
        .map(|&bit| if bit { 1.0 } else { -1.0 })
        .collect();
    let nominal = config.sample_rate as f32 / config.bit_rate;

    let mut best: Option<SyncResult> = None;
    for samples_per_bit in candidate_bit_lengths(nominal, params) {
        let kernel = SymbolKernel::new(
            samples_per_bit.round() as usize,
            config.freq0,
            config.freq1,
            config.sample_rate,
        );
        let span = preamble_span(samples_per_bit, pattern.len(), kernel.len());
        if span > samples.len() {
            continue;
        }
        let limit = samples.len() - span;

        // Coarse pass: stride a fraction of a bit across the whole buffer.
        // The pattern score is insensitive to sub-bit misalignment, so this
        // only has to land near the true start; it picks the neighborhood
        // to refine and never enters the final selection.
        let coarse_stride = (kernel.len() / params.coarse_divisor.max(1)).max(1);
        let mut coarse: Option<(usize, f32)> = None;
        let mut offset = 0;
        while offset <= limit {
            if let Some(score) = score_alignment(samples, offset, samples_per_bit, &kernel, &pattern)
            {
                if coarse.map_or(true, |(_, s)| score > s) {
                    coarse = Some((offset, score));
                }
            }
            offset += coarse_stride;
        }
        let Some((coarse_offset, _)) = coarse else {
            continue;
        };

        // Refined pass: rescan one bit on either side of the coarse winner
        // at single-sample stride. The pattern score alone cannot order
        // offsets that close to the true start, so each offset is also
        // weighted by the normalized cross-correlation between the capture
        // window and the expected preamble waveform. The product peaks at
        // the exact first preamble sample.
        let template = preamble_template(&preamble, samples_per_bit, nominal, config, span);
        let template_norm = template.iter().map(|t| t * t).sum::<f32>().sqrt();
        if template_norm < MIN_NORM {
            continue;
        }
        let refine_from = coarse_offset.saturating_sub(kernel.len());
        let refine_to = (coarse_offset + kernel.len()).min(limit);
        for offset in refine_from..=refine_to {
            let Some(shape) = score_alignment(samples, offset, samples_per_bit, &kernel, &pattern)
            else {
                continue;
            };
            let Some(fit) = template_match(samples, offset, &template, template_norm) else {
                continue;
            };
            let score = shape * fit;
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(SyncResult {
                    start: offset,
                    samples_per_bit,
                    score,
                });
            }
        }
    }

    if let Some(result) = &best {
        debug!(
            "preamble search: start={} samples_per_bit={:.2} score={:.3}",
            result.start, result.samples_per_bit, result.score
        );
    }
    best
}

/// Demodulates bit windows from `start` to the end of the buffer.
///
/// Window `k` begins at `start + round(k * samples_per_bit)`, so fractional
/// bit lengths step without accumulating rounding error. The final window
/// may be cut short by the buffer end and is scored over the samples that
/// remain, so the last bit of a capture with no trailing slack still
/// demodulates when the lock sits a few samples late.
pub fn demodulate_bits(
    samples: &[f32],
    start: usize,
    samples_per_bit: f32,
    kernel: &SymbolKernel,
) -> Vec<bool> {
    if kernel.is_empty() {
        return Vec::new();
    }
    let mut bits = Vec::new();
    let mut index = 0usize;
    loop {
        let begin = start + (index as f32 * samples_per_bit).round() as usize;
        if begin >= samples.len() {
            break;
        }
        let end = (begin + kernel.len()).min(samples.len());
        bits.push(kernel.discriminant(&samples[begin..end]) >= 0.0);
        index += 1;
    }
    bits
}

/// Normalized correlation between the discriminants of `pattern.len()`
/// consecutive bit windows and the expected bipolar pattern. `None` when a
/// window runs off the buffer or the discriminants carry no energy.
fn score_alignment(
    samples: &[f32],
    offset: usize,
    samples_per_bit: f32,
    kernel: &SymbolKernel,
    pattern: &[f32],
) -> Option<f32> {
    let mut discriminants = Vec::with_capacity(pattern.len());
    for k in 0..pattern.len() {
        let begin = offset + (k as f32 * samples_per_bit).round() as usize;
        let end = begin + kernel.len();
        if end > samples.len() {
            return None;
        }
        discriminants.push(kernel.discriminant(&samples[begin..end]));
    }
    let norm = discriminants
        .iter()
        .map(|d| d * d)
        .sum::<f32>()
        .sqrt();
    let denom = norm * (pattern.len() as f32).sqrt();
    if denom < MIN_NORM {
        return None;
    }
    let dot: f32 = discriminants
        .iter()
        .zip(pattern)
        .map(|(d, p)| d * p)
        .sum();
    Some(dot / denom)
}

/// Unit-amplitude rendering of the preamble for one candidate bit length.
///
/// Bit boundaries follow the fractional `samples_per_bit`, and the tone
/// frequencies are scaled by `nominal / samples_per_bit`: a capture clock
/// running fast or slow stretches the carriers by the same factor as the
/// bits.
fn preamble_template(
    bits: &[bool],
    samples_per_bit: f32,
    nominal: f32,
    config: &ModemConfig,
    span: usize,
) -> Vec<f32> {
    let scale = nominal / samples_per_bit;
    let mut template = vec![0.0f32; span];
    for (k, &bit) in bits.iter().enumerate() {
        let tone = if bit { config.freq1 } else { config.freq0 };
        let step = 2.0 * PI * tone * scale / config.sample_rate as f32;
        let origin = k as f32 * samples_per_bit;
        let begin = (origin.round() as usize).min(span);
        let end = if k + 1 == bits.len() {
            span
        } else {
            (((k + 1) as f32 * samples_per_bit).round() as usize).min(span)
        };
        for m in begin..end {
            template[m] = (step * (m as f32 - origin)).sin();
        }
    }
    template
}

/// Share of the capture window explained by the expected preamble waveform:
/// the magnitude of their normalized cross-correlation, in `[0, 1]`. `None`
/// when the window carries no energy. The magnitude keeps the measure blind
/// to capture polarity.
fn template_match(
    samples: &[f32],
    offset: usize,
    template: &[f32],
    template_norm: f32,
) -> Option<f32> {
    let segment = &samples[offset..offset + template.len()];
    let segment_norm = segment.iter().map(|&s| s * s).sum::<f32>().sqrt();
    let denom = segment_norm * template_norm;
    if denom < MIN_NORM {
        return None;
    }
    let dot: f32 = segment.iter().zip(template).map(|(&s, &t)| s * t).sum();
    Some((dot / denom).abs())
}

/// Samples covered by `bit_count` consecutive windows at the given spacing.
fn preamble_span(samples_per_bit: f32, bit_count: usize, window_len: usize) -> usize {
    ((bit_count.saturating_sub(1)) as f32 * samples_per_bit).round() as usize + window_len
}
