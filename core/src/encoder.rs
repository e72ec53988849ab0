//! Payload-to-waveform pipeline: framing, coding, interleaving, modulation.

use log::debug;

use crate::bfsk;
use crate::config::{FecScheme, ModemConfig};
use crate::error::Result;
use crate::fec::FecCodec;
use crate::framing;
use crate::interleave;

/// Coding layout of one encoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FecSummary {
    pub scheme: FecScheme,
    pub repetition_factor: usize,
    pub interleave_depth: usize,
    /// Payload bits before any coding.
    pub payload_bits: usize,
    /// Bits emitted by the coding stage, length header included when one is
    /// present.
    pub encoded_bits: usize,
}

/// What was transmitted, alongside the waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeMetadata {
    /// Total modulated bits, preamble included.
    pub bit_count: usize,
    /// Preamble pattern as configured.
    pub preamble_bits: String,
    pub freq0: f32,
    pub freq1: f32,
    pub bitrate: f32,
    pub fec: FecSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOutput {
    pub waveform: Vec<f32>,
    pub metadata: EncodeMetadata,
}

/// Turns payload bytes into a modulated waveform.
///
/// Construction validates the configuration; encoding itself cannot fail.
/// When an FEC scheme is active the frame starts with a 32-bit big-endian
/// payload length so the decoder can trim trailing channel bits; un-coded
/// frames omit the header and are read to the end of the capture.
pub struct Encoder {
    config: ModemConfig,
    codec: FecCodec,
}

impl Encoder {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        let codec = FecCodec::from_config(&config.fec)?;
        Ok(Self { config, codec })
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn encode(&self, payload: &[u8]) -> EncodeOutput {
        let payload_bits = framing::bytes_to_bits(payload);
        let payload_bit_count = payload_bits.len();

        let coded = self.config.fec.scheme != FecScheme::None;
        let frame_bits = if coded {
            let mut framed = framing::length_header(payload_bit_count as u32);
            framed.extend(payload_bits);
            framed
        } else {
            payload_bits
        };

        let mut encoded = self.codec.encode(&frame_bits);
        if coded && self.config.interleave_depth > 1 {
            encoded = interleave::interleave(&encoded, self.config.interleave_depth);
        }
        let encoded_bits = encoded.len();

        let mut stream = self.config.preamble_bits();
        stream.extend(encoded);
        let waveform = bfsk::modulate(&stream, &self.config);
        debug!(
            "encoded {} payload bytes as {} bits / {} samples",
            payload.len(),
            stream.len(),
            waveform.len()
        );

        EncodeOutput {
            waveform,
            metadata: EncodeMetadata {
                bit_count: stream.len(),
                preamble_bits: self.config.preamble.clone(),
                freq0: self.config.freq0,
                freq1: self.config.freq1,
                bitrate: self.config.bit_rate,
                fec: FecSummary {
                    scheme: self.config.fec.scheme,
                    repetition_factor: self.config.fec.repetition_factor,
                    interleave_depth: self.config.interleave_depth,
                    payload_bits: payload_bit_count,
                    encoded_bits,
                },
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
            freq0: 2_400.0,
            freq1: 2_400.0,
            ..ModemConfig::default()
        };
        assert!(Encoder::new(config).is_err());

        let config = ModemConfig {
            fec: FecConfig {
                scheme: FecScheme::Repetition,
                repetition_factor: 4,
            },
            ..ModemConfig::default()
        };
        assert!(Encoder::new(config).is_err());
    }

    #[test]
    fn test_uncoded_frame_has_no_header() {
        let encoder = Encoder::new(ModemConfig::default()).unwrap();
        let out = encoder.encode(b"hi");
        // 8 preamble bits plus 16 raw payload bits.
        assert_eq!(out.metadata.bit_count, 24);
        assert_eq!(out.metadata.fec.payload_bits, 16);
        assert_eq!(out.metadata.fec.encoded_bits, 16);
        assert_eq!(out.waveform.len(), 24 * 160);
    }

    #[test]
    fn test_coded_frame_prepends_length_header() {
        let config = ModemConfig {
            fec: FecConfig {
                scheme: FecScheme::Repetition,
                repetition_factor: 3,
            },
            ..ModemConfig::default()
        };
        let encoder = Encoder::new(config).unwrap();
        let out = encoder.encode(b"hi");
        // (32 header + 16 payload) bits, each repeated three times.
        assert_eq!(out.metadata.fec.encoded_bits, 48 * 3);
        assert_eq!(out.metadata.bit_count, 8 + 144);
    }

    #[test]
    fn test_hamming_frame_length() {
        let config = ModemConfig {
            fec: FecConfig {
                scheme: FecScheme::Hamming74,
                ..FecConfig::default()
            },
            ..ModemConfig::default()
        };
        let encoder = Encoder::new(config).unwrap();
        let out = encoder.encode(&[0xA5; 16]);
        // 32 + 128 = 160 frame bits, 40 codewords of 7 bits.
        assert_eq!(out.metadata.fec.encoded_bits, 280);
        assert_eq!(out.metadata.bit_count, 288);
    }

    #[test]
    fn test_empty_payload_still_emits_preamble() {
        let encoder = Encoder::new(ModemConfig::default()).unwrap();
        let out = encoder.encode(b"");
        assert_eq!(out.metadata.bit_count, 8);
        assert_eq!(out.waveform.len(), 8 * 160);
        assert_eq!(out.metadata.fec.payload_bits, 0);
    }

    #[test]
    fn test_metadata_mirrors_config() {
        let config = ModemConfig {
            preamble: "110010".to_string(),
            interleave_depth: 4,
            fec: FecConfig {
                scheme: FecScheme::Hamming74,
                ..FecConfig::default()
            },
            ..ModemConfig::default()
        };
        let encoder = Encoder::new(config).unwrap();
        let out = encoder.encode(b"x");
        assert_eq!(out.metadata.preamble_bits, "110010");
        assert_eq!(out.metadata.bitrate, 300.0);
        assert_eq!(out.metadata.freq0, 1_500.0);
        assert_eq!(out.metadata.freq1, 2_400.0);
        assert_eq!(out.metadata.fec.scheme, FecScheme::Hamming74);
        assert_eq!(out.metadata.fec.interleave_depth, 4);
    }
}
