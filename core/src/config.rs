use std::fmt;
use std::str::FromStr;

use crate::error::{ModemError, Result};
use crate::framing;

/// Forward error correction scheme selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecScheme {
    /// No coding. Frames carry no length header and are read to the end of
    /// the capture.
    None,
    /// Each bit replicated an odd number of times, decoded by majority vote.
    Repetition,
    /// (7,4) Hamming block code with single-bit correction per codeword.
    Hamming74,
}

impl FecScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            FecScheme::None => "none",
            FecScheme::Repetition => "repetition",
            FecScheme::Hamming74 => "hamming74",
        }
    }
}

impl fmt::Display for FecScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FecScheme {
    type Err = ModemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(FecScheme::None),
            "repetition" => Ok(FecScheme::Repetition),
            "hamming74" => Ok(FecScheme::Hamming74),
            _ => Err(ModemError::UnsupportedScheme(s.to_string())),
        }
    }
}

/// FEC layer settings carried by [`ModemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecConfig {
    pub scheme: FecScheme,
    /// Replication count for [`FecScheme::Repetition`]; must be odd so every
    /// vote has a majority.
    pub repetition_factor: usize,
}

impl Default for FecConfig {
    fn default() -> Self {
        Self {
            scheme: FecScheme::None,
            repetition_factor: 3,
        }
    }
}

/// Complete modem configuration, validated once when an
/// [`crate::Encoder`] or [`crate::Decoder`] is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemConfig {
    /// Sample rate of generated and captured waveforms, Hz.
    pub sample_rate: u32,
    /// Transmission speed, bits per second.
    pub bit_rate: f32,
    /// Tone frequency for a zero bit, Hz.
    pub freq0: f32,
    /// Tone frequency for a one bit, Hz.
    pub freq1: f32,
    /// Peak amplitude of generated tones.
    pub amplitude: f32,
    /// Synchronization pattern; '1' maps to a one bit, any other character
    /// to a zero bit.
    pub preamble: String,
    pub fec: FecConfig,
    /// Block depth for spreading burst errors across FEC groups; 1 disables
    /// interleaving. Only applied when an FEC scheme is active.
    pub interleave_depth: usize,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            bit_rate: 300.0,
            freq0: 1_500.0,
            freq1: 2_400.0,
            amplitude: 0.7,
            preamble: "10101010".to_string(),
            fec: FecConfig::default(),
            interleave_depth: 1,
        }
    }
}

impl ModemConfig {
    /// Check every field, returning the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ModemError::InvalidConfig(
                "sample_rate must be positive".to_string(),
            ));
        }
        if !self.bit_rate.is_finite() || self.bit_rate <= 0.0 {
            return Err(ModemError::InvalidConfig(
                "bit_rate must be positive".to_string(),
            ));
        }
        if !self.freq0.is_finite() || self.freq0 <= 0.0 {
            return Err(ModemError::InvalidConfig(
                "freq0 must be positive".to_string(),
            ));
        }
        if !self.freq1.is_finite() || self.freq1 <= 0.0 {
            return Err(ModemError::InvalidConfig(
                "freq1 must be positive".to_string(),
            ));
        }
        if self.freq0 == self.freq1 {
            return Err(ModemError::InvalidConfig(
                "freq0 and freq1 must differ".to_string(),
            ));
        }
        if !self.amplitude.is_finite() || self.amplitude <= 0.0 {
            return Err(ModemError::InvalidConfig(
                "amplitude must be positive".to_string(),
            ));
        }
        if self.preamble.is_empty() {
            return Err(ModemError::InvalidConfig(
                "preamble must not be empty".to_string(),
            ));
        }
        if self.interleave_depth < 1 {
            return Err(ModemError::InvalidConfig(
                "interleave_depth must be at least 1".to_string(),
            ));
        }
        if self.fec.scheme == FecScheme::Repetition {
            if self.fec.repetition_factor < 1 {
                return Err(ModemError::InvalidConfig(
                    "repetition factor must be at least 1".to_string(),
                ));
            }
            if self.fec.repetition_factor % 2 == 0 {
                return Err(ModemError::InvalidConfig(
                    "repetition factor must be odd for majority voting".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Nominal bit length in samples: `sample_rate / bit_rate` rounded to the
    /// nearest integer, at least 1.
    pub fn samples_per_bit(&self) -> usize {
        let nominal = self.sample_rate as f32 / self.bit_rate;
        (nominal.round() as usize).max(1)
    }

    /// Preamble pattern expanded to bits.
    pub fn preamble_bits(&self) -> Vec<bool> {
        framing::preamble_to_bits(&self.preamble)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ModemConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let config = ModemConfig {
            sample_rate: 0,
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_bit_rate() {
        let config = ModemConfig {
            bit_rate: 0.0,
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ModemConfig {
            bit_rate: -300.0,
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_equal_tone_frequencies() {
        let config = ModemConfig {
            freq0: 2_000.0,
            freq1: 2_000.0,
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_preamble() {
        let config = ModemConfig {
            preamble: String::new(),
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_interleave_depth() {
        let config = ModemConfig {
            interleave_depth: 0,
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_even_repetition_factor() {
        let config = ModemConfig {
            fec: FecConfig {
                scheme: FecScheme::Repetition,
                repetition_factor: 4,
            },
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn even_factor_is_fine_when_repetition_is_inactive() {
        // The factor is only meaningful for the repetition scheme.
        let config = ModemConfig {
            fec: FecConfig {
                scheme: FecScheme::Hamming74,
                repetition_factor: 4,
            },
            ..ModemConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn samples_per_bit_rounds_to_nearest() {
        let config = ModemConfig {
            sample_rate: 48_000,
            bit_rate: 300.0,
            ..ModemConfig::default()
        };
        assert_eq!(config.samples_per_bit(), 160);

        // 1000 / 600 = 1.67 rounds up rather than truncating.
        let config = ModemConfig {
            sample_rate: 1_000,
            bit_rate: 600.0,
            ..ModemConfig::default()
        };
        assert_eq!(config.samples_per_bit(), 2);
    }

    #[test]
    fn samples_per_bit_never_drops_below_one() {
        let config = ModemConfig {
            sample_rate: 100,
            bit_rate: 1_000.0,
            ..ModemConfig::default()
        };
        assert_eq!(config.samples_per_bit(), 1);
    }

    #[test]
    fn scheme_parses_case_insensitively() {
        assert_eq!("none".parse::<FecScheme>().unwrap(), FecScheme::None);
        assert_eq!(
            "Repetition".parse::<FecScheme>().unwrap(),
            FecScheme::Repetition
        );
        assert_eq!(
            "HAMMING74".parse::<FecScheme>().unwrap(),
            FecScheme::Hamming74
        );
    }

    #[test]
    fn unknown_scheme_reports_the_offending_name() {
        let err = "turbo".parse::<FecScheme>().unwrap_err();
        assert!(err.to_string().contains("turbo"));
    }

    #[test]
    fn scheme_display_round_trips() {
        for scheme in [FecScheme::None, FecScheme::Repetition, FecScheme::Hamming74] {
            assert_eq!(scheme.to_string().parse::<FecScheme>().unwrap(), scheme);
        }
    }

    #[test]
    fn preamble_bits_maps_ones_and_zeros() {
        let config = ModemConfig {
            preamble: "10x1".to_string(),
            ..ModemConfig::default()
        };
        assert_eq!(config.preamble_bits(), vec![true, false, false, true]);
    }
}
