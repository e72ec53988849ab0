//! Waveform-to-payload pipeline: synchronization, demodulation, frame
//! parsing.
//!
//! Decoding is total. Configuration problems fail at construction; a bad
//! capture never returns an error, it returns an empty or best-effort
//! payload with a [`DecodeStatus`] and metrics describing how far the
//! pipeline got.

use std::fmt;

use log::debug;

use crate::bfsk::SymbolKernel;
use crate::config::{FecScheme, ModemConfig};
use crate::error::Result;
use crate::fec::{FecCodec, FecStats};
use crate::framing;
use crate::interleave;
use crate::sync::{self, SyncParams};

/// How a decode attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Payload recovered with no unrepaired damage detected.
    Ok,
    /// No alignment reached the confidence threshold.
    PreambleNotFound,
    /// The capture is too short to hold one preamble.
    InsufficientData,
    /// Too few bits survived decoding to read the length header.
    HeaderNotRecovered,
    /// Blocks with unrepairable damage were seen; the payload is a best
    /// effort and may be corrupt.
    FecFailed,
}

impl DecodeStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, DecodeStatus::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeStatus::Ok => "ok",
            DecodeStatus::PreambleNotFound => "preamble_not_found",
            DecodeStatus::InsufficientData => "insufficient_data",
            DecodeStatus::HeaderNotRecovered => "header_not_recovered",
            DecodeStatus::FecFailed => "fec_failed",
        }
    }
}

impl fmt::Display for DecodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coding-layer accounting for one decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FecReport {
    pub scheme: FecScheme,
    pub repetition_factor: usize,
    pub interleave_depth: usize,
    /// Payload bits taken from the frame after header truncation.
    pub payload_bits: usize,
    /// Bits that entered the coding stage (everything after the preamble).
    pub encoded_bits: usize,
    /// Bits the length header declared but the capture did not deliver.
    pub truncated_bits: usize,
    pub stats: FecStats,
}

/// Everything measured on the way from samples to bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeMetrics {
    /// Bits demodulated from the capture, preamble included.
    pub bit_count: usize,
    /// Length of the configured preamble, in bits.
    pub preamble_bits: usize,
    pub bitrate: f32,
    /// Resolved bit length in samples, after the drift sweep.
    pub samples_per_bit: f32,
    /// Preamble correlation of the chosen (or best rejected) alignment.
    pub sync_score: f32,
    /// Sample offset of the chosen (or best rejected) alignment.
    pub sync_start: usize,
    pub status: DecodeStatus,
    /// Frame bits that became payload, before byte packing.
    pub data_bits: usize,
    pub fec: FecReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutput {
    pub payload: Vec<u8>,
    pub metrics: DecodeMetrics,
}

/// Turns captured samples back into payload bytes.
///
/// One decoder is reusable across captures and holds no mutable state, so
/// concurrent decodes only need a shared reference.
pub struct Decoder {
    config: ModemConfig,
    codec: FecCodec,
    sync_params: SyncParams,
}

impl Decoder {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        let codec = FecCodec::from_config(&config.fec)?;
        Ok(Self {
            config,
            codec,
            sync_params: SyncParams::default(),
        })
    }

    /// Replaces the synchronization tuning, for captures the defaults do
    /// not fit (for example a wider clock-drift sweep).
    pub fn with_sync_params(mut self, params: SyncParams) -> Self {
        self.sync_params = params;
        self
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn decode(&self, waveform: &[f32]) -> DecodeOutput {
        let preamble_len = self.config.preamble_bits().len();
        let nominal_bit = self.config.samples_per_bit();

        let normalized = sync::normalize_gain(waveform, &self.sync_params);
        let located = sync::find_preamble(&normalized, &self.config, &self.sync_params);

        let Some(found) = located else {
            // Nothing scorable: either the buffer cannot hold a preamble at
            // all, or it held no energy anywhere.
            let status = if waveform.len() < preamble_len * nominal_bit {
                DecodeStatus::InsufficientData
            } else {
                DecodeStatus::PreambleNotFound
            };
            debug!("decode failed before sync: {status}");
            return self.failure(status, nominal_bit as f32, 0.0, 0);
        };

        if found.score < self.sync_params.min_score {
            debug!(
                "best alignment below confidence: score {:.3} at {}",
                found.score, found.start
            );
            return self.failure(
                DecodeStatus::PreambleNotFound,
                found.samples_per_bit,
                found.score,
                found.start,
            );
        }

        let kernel = SymbolKernel::new(
            found.samples_per_bit.round() as usize,
            self.config.freq0,
            self.config.freq1,
            self.config.sample_rate,
        );
        let bits = sync::demodulate_bits(&normalized, found.start, found.samples_per_bit, &kernel);
        let body = &bits[preamble_len.min(bits.len())..];

        let mut metrics = DecodeMetrics {
            bit_count: bits.len(),
            preamble_bits: preamble_len,
            bitrate: self.config.bit_rate,
            samples_per_bit: found.samples_per_bit,
            sync_score: found.score,
            sync_start: found.start,
            status: DecodeStatus::Ok,
            data_bits: 0,
            fec: self.empty_report(),
        };
        metrics.fec.encoded_bits = body.len();

        if self.config.fec.scheme == FecScheme::None {
            // No header: every remaining bit is payload, including whatever
            // trails the frame in the capture.
            let payload = framing::bits_to_bytes(body);
            metrics.data_bits = body.len();
            metrics.fec.payload_bits = body.len();
            debug!("decode ok: {} uncoded payload bits", body.len());
            return DecodeOutput { payload, metrics };
        }

        let deinterleaved;
        let coded: &[bool] = if self.config.interleave_depth > 1 {
            deinterleaved = interleave::deinterleave(body, self.config.interleave_depth);
            &deinterleaved
        } else {
            body
        };

        let (decoded, stats) = self.codec.decode(coded);
        metrics.fec.stats = stats;

        if decoded.len() < framing::LENGTH_HEADER_BITS {
            metrics.status = DecodeStatus::HeaderNotRecovered;
            debug!(
                "decode failed: {} bits after coding, header needs {}",
                decoded.len(),
                framing::LENGTH_HEADER_BITS
            );
            return DecodeOutput {
                payload: Vec::new(),
                metrics,
            };
        }

        let declared = framing::read_length_header(&decoded) as usize;
        let available = &decoded[framing::LENGTH_HEADER_BITS..];
        let taken = declared.min(available.len());
        metrics.fec.truncated_bits = declared - taken;
        metrics.fec.payload_bits = taken;
        metrics.data_bits = taken;
        metrics.status = if stats.uncorrectable_blocks > 0 {
            DecodeStatus::FecFailed
        } else {
            DecodeStatus::Ok
        };
        let payload = framing::bits_to_bytes(&available[..taken]);
        debug!(
            "decode {}: {} of {} declared payload bits, {} corrected",
            metrics.status, taken, declared, stats.corrected_bits
        );
        DecodeOutput { payload, metrics }
    }

    fn empty_report(&self) -> FecReport {
        FecReport {
            scheme: self.config.fec.scheme,
            repetition_factor: self.config.fec.repetition_factor,
            interleave_depth: self.config.interleave_depth,
            payload_bits: 0,
            encoded_bits: 0,
            truncated_bits: 0,
            stats: FecStats::default(),
        }
    }

    fn failure(
        &self,
        status: DecodeStatus,
        samples_per_bit: f32,
        sync_score: f32,
        sync_start: usize,
    ) -> DecodeOutput {
        DecodeOutput {
            payload: Vec::new(),
            metrics: DecodeMetrics {
                bit_count: 0,
                preamble_bits: self.config.preamble_bits().len(),
                bitrate: self.config.bit_rate,
                samples_per_bit,
                sync_score,
                sync_start,
                status,
                data_bits: 0,
                fec: self.empty_report(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FecConfig;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ModemConfig {
            preamble: String::new(),
            ..ModemConfig::default()
        };
        assert!(Decoder::new(config).is_err());

        let config = ModemConfig {
            fec: FecConfig {
                scheme: FecScheme::Repetition,
                repetition_factor: 2,
            },
            ..ModemConfig::default()
        };
        assert!(Decoder::new(config).is_err());
    }

    #[test]
    fn test_exposes_validated_config() {
        let config = ModemConfig {
            bit_rate: 600.0,
            ..ModemConfig::default()
        };
        let decoder = Decoder::new(config.clone()).unwrap();
        assert_eq!(decoder.config(), &config);
        assert_eq!(decoder.config().samples_per_bit(), 80);
    }

    #[test]
    fn test_short_capture_reports_insufficient_data() {
        let decoder = Decoder::new(ModemConfig::default()).unwrap();
        let out = decoder.decode(&vec![0.0; 100]);
        assert_eq!(out.metrics.status, DecodeStatus::InsufficientData);
        assert!(out.payload.is_empty());
        assert_eq!(out.metrics.bit_count, 0);

        let out = decoder.decode(&[]);
        assert_eq!(out.metrics.status, DecodeStatus::InsufficientData);
    }

    #[test]
    fn test_silence_reports_preamble_not_found() {
        let decoder = Decoder::new(ModemConfig::default()).unwrap();
        let out = decoder.decode(&vec![0.0; 48_000]);
        assert_eq!(out.metrics.status, DecodeStatus::PreambleNotFound);
        assert!(out.payload.is_empty());
        assert!(!out.metrics.status.is_ok());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(DecodeStatus::Ok.as_str(), "ok");
        assert_eq!(DecodeStatus::PreambleNotFound.as_str(), "preamble_not_found");
        assert_eq!(DecodeStatus::InsufficientData.as_str(), "insufficient_data");
        assert_eq!(
            DecodeStatus::HeaderNotRecovered.as_str(),
            "header_not_recovered"
        );
        assert_eq!(DecodeStatus::FecFailed.as_str(), "fec_failed");
        assert!(DecodeStatus::Ok.is_ok());
        assert!(!DecodeStatus::FecFailed.is_ok());
        assert_eq!(format!("{}", DecodeStatus::FecFailed), "fec_failed");
    }
}
