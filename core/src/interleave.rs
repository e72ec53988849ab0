//! Column-major block interleaving.
//!
//! A burst of consecutive channel errors lands in different FEC groups after
//! de-interleaving, which is what lets repetition and Hamming coding recover
//! from it. Bits are written row-major into a `ceil(n / depth) x depth` grid
//! and read back column-major; grid cells past the bit count are skipped, so
//! no padding is ever added and any length interleaves cleanly.

/// Re-order `bits` column-major across `depth` columns.
///
/// `depth <= 1` and inputs of at most one bit are returned unchanged.
pub fn interleave(bits: &[bool], depth: usize) -> Vec<bool> {
    if depth <= 1 || bits.len() <= 1 {
        return bits.to_vec();
    }
    interleave_indices(bits.len(), depth)
        .into_iter()
        .map(|index| bits[index])
        .collect()
}

/// Exact inverse of [`interleave`] for the same `depth`, for every input
/// length including those not divisible by `depth`.
pub fn deinterleave(bits: &[bool], depth: usize) -> Vec<bool> {
    if depth <= 1 || bits.len() <= 1 {
        return bits.to_vec();
    }
    let order = interleave_indices(bits.len(), depth);
    let mut restored = vec![false; bits.len()];
    for (read_position, &source_index) in order.iter().enumerate() {
        restored[source_index] = bits[read_position];
    }
    restored
}

/// Source index for each output position of the column-major read-out.
fn interleave_indices(length: usize, depth: usize) -> Vec<usize> {
    let rows = (length + depth - 1) / depth;
    let mut order = Vec::with_capacity(length);
    for column in 0..depth {
        for row in 0..rows {
            let index = row * depth + column;
            if index < length {
                order.push(index);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_bits(len: usize, seed: u64) -> Vec<bool> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 33) & 1 == 1
            })
            .collect()
    }

    #[test]
    fn depth_one_is_identity() {
        let bits = pseudo_bits(17, 1);
        assert_eq!(interleave(&bits, 1), bits);
        assert_eq!(deinterleave(&bits, 1), bits);
    }

    #[test]
    fn known_permutation_for_depth_three() {
        // 10 bits across 3 columns: rows are 012, 345, 678, 9--, so the
        // column-major read-out is 0 3 6 9 | 1 4 7 | 2 5 8.
        let bits: Vec<bool> = (0..10).map(|i| i % 4 == 0).collect();
        let expected: Vec<bool> = [0, 3, 6, 9, 1, 4, 7, 2, 5, 8]
            .iter()
            .map(|&i: &usize| i % 4 == 0)
            .collect();
        assert_eq!(interleave(&bits, 3), expected);
    }

    #[test]
    fn spreads_adjacent_bits_apart() {
        let mut bits = vec![false; 12];
        bits[4] = true;
        bits[5] = true;
        let spread = interleave(&bits, 4);
        let positions: Vec<usize> = spread
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect();
        assert_eq!(positions.len(), 2);
        assert!(positions[1] - positions[0] >= 3);
    }

    #[test]
    fn deinterleave_inverts_interleave_for_all_shapes() {
        for depth in 1..=9 {
            for len in 0..=25 {
                let bits = pseudo_bits(len, depth as u64 * 31 + len as u64);
                let round_tripped = deinterleave(&interleave(&bits, depth), depth);
                assert_eq!(round_tripped, bits, "depth={depth} len={len}");
            }
        }
    }

    #[test]
    fn depth_larger_than_input_is_identity() {
        let bits = pseudo_bits(3, 7);
        assert_eq!(interleave(&bits, 8), bits);
        assert_eq!(deinterleave(&bits, 8), bits);
    }

    #[test]
    fn empty_input() {
        assert!(interleave(&[], 5).is_empty());
        assert!(deinterleave(&[], 5).is_empty());
    }
}
