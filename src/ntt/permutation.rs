//! Index permutations between the software stages, the pipeline and natural order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::Residue;
use crate::utils::{is_power_of_two, num_chunks};

/// Reverses the lowest `bits` bits of `index`.
#[inline]
pub const fn bit_reverse(index: usize, bits: usize) -> usize {
    if bits == 0 {
        0
    } else {
        index.reverse_bits() >> (usize::BITS as usize - bits)
    }
}

/// Splits every block of `last_stride` residues into its even offsets followed
/// by its odd offsets, preserving relative order within each half.
pub fn rearrange_sample(src: &[Residue], dst: &mut [Residue], last_stride: usize) {
    assert_eq!(src.len(), dst.len());
    assert!(last_stride >= 2 && is_power_of_two(last_stride));
    let half = last_stride / 2;
    for (src, dst) in src
        .chunks_exact(last_stride)
        .zip(dst.chunks_exact_mut(last_stride))
    {
        for j in 0..half {
            dst[j] = src[2 * j];
            dst[j + half] = src[2 * j + 1];
        }
    }
}

/// Applies [`rearrange_sample`] to every sample of `n` residues in a batch.
pub fn rearrange(src: &[Residue], dst: &mut [Residue], n: usize, last_stride: usize) {
    assert_eq!(src.len(), dst.len());
    assert_eq!(n % last_stride, 0);
    num_chunks(src, n);
    #[cfg(not(feature = "parallel"))]
    src.chunks_exact(n)
        .zip(dst.chunks_exact_mut(n))
        .for_each(|(src, dst)| rearrange_sample(src, dst, last_stride));
    #[cfg(feature = "parallel")]
    src.par_chunks_exact(n)
        .zip(dst.par_chunks_exact_mut(n))
        .for_each(|(src, dst)| rearrange_sample(src, dst, last_stride));
}

/// Writes each sample of `src` to `dst` in bit-reversed order:
/// `dst[bitrev(j)] = src[j]`.
pub fn bit_reverse_batch(src: &[Residue], dst: &mut [Residue], n: usize) {
    assert_eq!(src.len(), dst.len());
    assert!(is_power_of_two(n));
    num_chunks(src, n);
    let bits = n.trailing_zeros() as usize;
    let permute = |(src, dst): (&[Residue], &mut [Residue])| {
        for (j, &value) in src.iter().enumerate() {
            dst[bit_reverse(j, bits)] = value;
        }
    };
    #[cfg(not(feature = "parallel"))]
    src.chunks_exact(n)
        .zip(dst.chunks_exact_mut(n))
        .for_each(permute);
    #[cfg(feature = "parallel")]
    src.par_chunks_exact(n)
        .zip(dst.par_chunks_exact_mut(n))
        .for_each(permute);
}

#[cfg(test)]
mod tests {
    use proptest::proptest;

    use super::*;

    #[test]
    fn test_bit_reverse_indices() {
        let reversed: Vec<usize> = (0..8).map(|j| bit_reverse(j, 3)).collect();
        assert_eq!(reversed, vec![0, 4, 2, 6, 1, 5, 3, 7]);
        assert_eq!(bit_reverse(0b0001, 4), 0b1000);
        assert_eq!(bit_reverse(0b0110, 4), 0b0110);
        assert_eq!(bit_reverse(0, 0), 0);
    }

    #[test]
    fn test_bit_reverse_batch_involution() {
        let input: Vec<Residue> = (0..8).collect();
        let mut once = vec![0; 8];
        bit_reverse_batch(&input, &mut once, 8);
        assert_eq!(once, vec![0, 4, 2, 6, 1, 5, 3, 7]);

        let mut twice = vec![0; 8];
        bit_reverse_batch(&once, &mut twice, 8);
        assert_eq!(twice, input);
    }

    #[test]
    fn test_bit_reverse_batch_per_sample() {
        let input: Vec<Residue> = (0..16).collect();
        let mut out = vec![0; 16];
        bit_reverse_batch(&input, &mut out, 4);
        assert_eq!(out, vec![0, 2, 1, 3, 4, 6, 5, 7, 8, 10, 9, 11, 12, 14, 13, 15]);
    }

    #[test]
    fn test_bit_reverse_involution_property() {
        proptest!(|(bits in 0_usize..20, index: usize)| {
            let index = if bits == 0 { 0 } else { index % (1 << bits) };
            let reversed = bit_reverse(index, bits);
            assert!(bits == 0 || reversed < 1 << bits);
            assert_eq!(bit_reverse(reversed, bits), index);
        });
    }

    #[test]
    fn test_rearrange_blocks() {
        let input: Vec<Residue> = (0..8).collect();
        let mut out = vec![0; 8];
        rearrange(&input, &mut out, 8, 4);
        assert_eq!(out, vec![0, 2, 1, 3, 4, 6, 5, 7]);

        rearrange(&input, &mut out, 8, 8);
        assert_eq!(out, vec![0, 2, 4, 6, 1, 3, 5, 7]);

        // Blocks of two are already split.
        rearrange(&input, &mut out, 8, 2);
        assert_eq!(out, input);
    }

    #[test]
    fn test_rearrange_is_per_sample() {
        let input: Vec<Residue> = (0..16).collect();
        let mut out = vec![0; 16];
        rearrange(&input, &mut out, 8, 8);
        assert_eq!(
            out,
            vec![0, 2, 4, 6, 1, 3, 5, 7, 8, 10, 12, 14, 9, 11, 13, 15]
        );
    }

    #[test]
    fn test_rearrange_cascade_is_bit_reversal() {
        for log_n in 1..=10 {
            let n = 1 << log_n;
            let mut values: Vec<Residue> = (0..n as Residue).collect();
            let mut scratch = vec![0; n];
            let mut block = n;
            while block >= 2 {
                rearrange_sample(&values, &mut scratch, block);
                std::mem::swap(&mut values, &mut scratch);
                block /= 2;
            }
            let expected: Vec<Residue> = (0..n).map(|j| bit_reverse(j, log_n) as Residue).collect();
            assert_eq!(values, expected, "n = {n}");
        }
    }
}
