//! Forward error correction over bit sequences.
//!
//! Three schemes share one encode/decode contract: a pass-through used when
//! coding is disabled, an odd-factor repetition code decoded by majority
//! vote, and a (7,4) Hamming block code that corrects one flipped bit per
//! codeword. Decoding never fails; damage beyond what a scheme can repair
//! surfaces in [`FecStats`] and in the recovered bits themselves.

use crate::config::{FecConfig, FecScheme};
use crate::error::{ModemError, Result};

const CODEWORD_BITS: usize = 7;
const DATA_BITS: usize = 4;

/// (7,4) Hamming generator. Codeword bit `r` is the parity of the data bits
/// selected by row `r`; positions 0, 1 and 3 carry parity, the rest carry
/// data verbatim.
const GENERATOR: [[u8; DATA_BITS]; CODEWORD_BITS] = [
    [1, 1, 0, 1],
    [1, 0, 1, 1],
    [1, 0, 0, 0],
    [0, 1, 1, 1],
    [0, 1, 0, 0],
    [0, 0, 1, 0],
    [0, 0, 0, 1],
];

/// Parity-check matrix. Row `i` contributes bit `i` of the syndrome, and the
/// syndrome value is the one-based position of a single flipped bit.
const PARITY_CHECK: [[u8; CODEWORD_BITS]; 3] = [
    [1, 0, 1, 0, 1, 0, 1],
    [0, 1, 1, 0, 0, 1, 1],
    [0, 0, 0, 1, 1, 1, 1],
];

/// Codeword positions holding data bits, in data order.
const DATA_POSITIONS: [usize; DATA_BITS] = [2, 4, 5, 6];

/// Counters describing what a decode had to repair or throw away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FecStats {
    /// Repetition: total bits that disagreed with their group's majority.
    /// Hamming: number of codewords where a single-bit error was corrected.
    pub corrected_bits: usize,
    /// Blocks whose syndrome admitted no correction. The (7,4) parity check
    /// cannot produce one, but the counter exists rather than an assumption.
    pub uncorrectable_blocks: usize,
    /// Trailing bits discarded because they did not fill a complete block.
    pub discarded_symbols: usize,
}

/// A concrete coding scheme. The set is closed, so an enum rather than a
/// trait object; every arm is pure and stateless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecCodec {
    None,
    Repetition(usize),
    Hamming74,
}

impl FecCodec {
    /// Builds the codec described by `config`.
    ///
    /// Repetition factors must be odd so every majority vote has a winner;
    /// an even or zero factor is rejected here, before any frame is built.
    pub fn from_config(config: &FecConfig) -> Result<Self> {
        match config.scheme {
            FecScheme::None => Ok(FecCodec::None),
            FecScheme::Repetition => {
                let factor = config.repetition_factor;
                if factor == 0 {
                    return Err(ModemError::InvalidConfig(
                        "repetition factor must be at least 1".into(),
                    ));
                }
                if factor % 2 == 0 {
                    return Err(ModemError::InvalidConfig(format!(
                        "repetition factor must be odd, got {factor}"
                    )));
                }
                Ok(FecCodec::Repetition(factor))
            }
            FecScheme::Hamming74 => Ok(FecCodec::Hamming74),
        }
    }

    /// Expands `bits` into their coded form.
    pub fn encode(&self, bits: &[bool]) -> Vec<bool> {
        match *self {
            FecCodec::None => bits.to_vec(),
            FecCodec::Repetition(factor) => encode_repetition(bits, factor),
            FecCodec::Hamming74 => encode_hamming(bits),
        }
    }

    /// Recovers data bits from a coded stream.
    ///
    /// Trailing bits that do not fill a whole block are dropped and counted
    /// as discarded. The returned bits are a best effort: repetition groups
    /// outvote stray flips, Hamming repairs one flip per codeword, and
    /// anything worse comes back wrong but accounted for.
    pub fn decode(&self, bits: &[bool]) -> (Vec<bool>, FecStats) {
        match *self {
            FecCodec::None => (bits.to_vec(), FecStats::default()),
            FecCodec::Repetition(factor) => decode_repetition(bits, factor),
            FecCodec::Hamming74 => decode_hamming(bits),
        }
    }
}

fn encode_repetition(bits: &[bool], factor: usize) -> Vec<bool> {
    let mut encoded = Vec::with_capacity(bits.len() * factor);
    for &bit in bits {
        encoded.extend(std::iter::repeat(bit).take(factor));
    }
    encoded
}

fn decode_repetition(bits: &[bool], factor: usize) -> (Vec<bool>, FecStats) {
    let usable = bits.len() - bits.len() % factor;
    let mut stats = FecStats {
        discarded_symbols: bits.len() - usable,
        ..FecStats::default()
    };
    let mut decoded = Vec::with_capacity(usable / factor);
    for group in bits[..usable].chunks_exact(factor) {
        let ones = group.iter().filter(|&&b| b).count();
        let majority = ones > factor / 2;
        // Every bit on the losing side of the vote was a corrected error.
        stats.corrected_bits += if majority { factor - ones } else { ones };
        decoded.push(majority);
    }
    (decoded, stats)
}

fn encode_hamming(bits: &[bool]) -> Vec<bool> {
    let mut padded = bits.to_vec();
    let remainder = padded.len() % DATA_BITS;
    if remainder != 0 {
        padded.resize(padded.len() + DATA_BITS - remainder, false);
    }
    let mut encoded = Vec::with_capacity(padded.len() / DATA_BITS * CODEWORD_BITS);
    for group in padded.chunks_exact(DATA_BITS) {
        for row in &GENERATOR {
            let mut parity = false;
            for (&coefficient, &bit) in row.iter().zip(group) {
                if coefficient == 1 {
                    parity ^= bit;
                }
            }
            encoded.push(parity);
        }
    }
    encoded
}

fn decode_hamming(bits: &[bool]) -> (Vec<bool>, FecStats) {
    let usable = bits.len() - bits.len() % CODEWORD_BITS;
    let mut stats = FecStats {
        discarded_symbols: bits.len() - usable,
        ..FecStats::default()
    };
    let mut decoded = Vec::with_capacity(usable / CODEWORD_BITS * DATA_BITS);
    for block in bits[..usable].chunks_exact(CODEWORD_BITS) {
        let mut codeword = [false; CODEWORD_BITS];
        codeword.copy_from_slice(block);

        let mut syndrome = 0usize;
        for (i, row) in PARITY_CHECK.iter().enumerate() {
            let mut parity = false;
            for (&coefficient, &bit) in row.iter().zip(codeword.iter()) {
                if coefficient == 1 {
                    parity ^= bit;
                }
            }
            if parity {
                syndrome |= 1 << i;
            }
        }
        match syndrome {
            0 => {}
            1..=CODEWORD_BITS => {
                codeword[syndrome - 1] = !codeword[syndrome - 1];
                stats.corrected_bits += 1;
            }
            _ => stats.uncorrectable_blocks += 1,
        }

        for &position in &DATA_POSITIONS {
            decoded.push(codeword[position]);
        }
    }
    (decoded, stats)
}
