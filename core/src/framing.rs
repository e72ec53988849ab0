//! Bit-level framing: byte/bit expansion, the payload-length header carried
//! by FEC-coded frames, and the preamble pattern.
//!
//! Everything here is a pure transform; nothing allocates beyond its return
//! value.

/// Width of the payload-length header prepended to FEC-coded frames.
///
/// Frames without FEC are header-less: an un-coded frame is decoded until
/// the capture runs out, not until a declared length is reached.
pub const LENGTH_HEADER_BITS: usize = 32;

/// Expand bytes into bits, most significant bit first.
pub fn bytes_to_bits(data: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for &byte in data {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1 == 1);
        }
    }
    bits
}

/// Pack bits into bytes, most significant bit first, zero-padding the final
/// partial byte on the right.
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((bits.len() + 7) / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (position, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 1 << (7 - position);
            }
        }
        bytes.push(byte);
    }
    bytes
}

/// Encode a payload bit count as a 32-bit big-endian header.
pub fn length_header(bit_count: u32) -> Vec<bool> {
    bytes_to_bits(&bit_count.to_be_bytes())
}

/// Read the 32-bit big-endian length header from the front of `bits`.
///
/// Callers must pass at least [`LENGTH_HEADER_BITS`] bits.
pub fn read_length_header(bits: &[bool]) -> u32 {
    let mut value = 0u32;
    for &bit in &bits[..LENGTH_HEADER_BITS] {
        value = (value << 1) | u32::from(bit);
    }
    value
}

/// Map a preamble pattern to bits: '1' becomes a one bit, any other
/// character a zero bit.
pub fn preamble_to_bits(pattern: &str) -> Vec<bool> {
    pattern.chars().map(|c| c == '1').collect()
}
