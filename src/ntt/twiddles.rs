//! Powers of the primitive root used by the two transform variants.

use std::ops::Index;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{modular::mod_power, permutation::bit_reverse, Residue};
use crate::{errors::DomainError, parameters::NttParameters};

/// `[ψ^0, ψ^1, ..., ψ^(count-1)] mod q`.
fn psi_powers(params: &NttParameters, count: usize) -> Result<Vec<Residue>, DomainError> {
    (0..count)
        .map(|e| {
            mod_power(i64::from(params.psi), e as u64, u64::from(params.modulus))
                .map(|v| v as Residue)
        })
        .collect()
}

/// The `n × n` negative-wrapped transform matrix, stored row-major:
/// `Omega[i][j] = ψ^((2ij + j) mod 2n)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmegaMatrix {
    n: usize,
    entries: Vec<Residue>,
}

impl OmegaMatrix {
    pub fn new(params: &NttParameters) -> Result<Self, DomainError> {
        let n = params.n;
        let two_n = 2 * n;
        let powers = psi_powers(params, two_n)?;
        let mut entries = vec![0; n * n];

        let fill_row = |(i, row): (usize, &mut [Residue])| {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = powers[(2 * i * j + j) % two_n];
            }
        };
        #[cfg(not(feature = "parallel"))]
        entries.chunks_exact_mut(n).enumerate().for_each(fill_row);
        #[cfg(feature = "parallel")]
        entries.par_chunks_exact_mut(n).enumerate().for_each(fill_row);

        Ok(Self { n, entries })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn row(&self, i: usize) -> &[Residue] {
        &self.entries[i * self.n..(i + 1) * self.n]
    }
}

impl Index<(usize, usize)> for OmegaMatrix {
    type Output = Residue;

    fn index(&self, (i, j): (usize, usize)) -> &Residue {
        assert!(j < self.n);
        &self.entries[i * self.n + j]
    }
}

/// Twiddle factors for the staged butterfly in bit-reversed order:
/// `tw[k] = ψ^bitrev(k)` for `k` in `0..n`.
///
/// Stage `s` reads the entries `2^s..2^(s+1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwiddleTable(Vec<Residue>);

impl TwiddleTable {
    pub fn new(params: &NttParameters) -> Result<Self, DomainError> {
        let powers = psi_powers(params, params.n)?;
        Ok(Self(
            (0..params.n)
                .map(|k| powers[bit_reverse(k, params.log_n)])
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Residue] {
        &self.0
    }
}

impl Index<usize> for TwiddleTable {
    type Output = Residue;

    fn index(&self, index: usize) -> &Residue {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> NttParameters {
        NttParameters::new(8, 17, 1, Some(3)).unwrap()
    }

    #[test]
    fn test_omega_matrix_entries() {
        let params = small_params();
        let omega = OmegaMatrix::new(&params).unwrap();
        assert_eq!(omega.size(), 8);
        for i in 0..8 {
            for j in 0..8 {
                let exp = (2 * i * j + j) % 16;
                let expected = mod_power(3, exp as u64, 17).unwrap() as Residue;
                assert_eq!(omega[(i, j)], expected, "Mismatch at ({i}, {j})");
            }
        }
        // Column 0 is ψ^0 everywhere, row 0 is ψ^j.
        assert!((0..8).all(|i| omega[(i, 0)] == 1));
        assert_eq!(omega.row(0), &[1, 3, 9, 10, 13, 5, 15, 11]);
    }

    #[test]
    fn test_omega_matrix_is_not_plain_dft() {
        // The half-index twist makes entry (1, 1) equal ψ^3 instead of ψ^2.
        let omega = OmegaMatrix::new(&small_params()).unwrap();
        assert_eq!(omega[(1, 1)], 27 % 17);
    }

    #[test]
    fn test_twiddle_table_bit_reversed() {
        let params = small_params();
        let table = TwiddleTable::new(&params).unwrap();
        assert_eq!(table.len(), 8);
        // bitrev over 3 bits: [0, 4, 2, 6, 1, 5, 3, 7]
        let expected: Vec<Residue> = [0, 4, 2, 6, 1, 5, 3, 7]
            .iter()
            .map(|&e| mod_power(3, e, 17).unwrap() as Residue)
            .collect();
        assert_eq!(table.as_slice(), expected.as_slice());
        // First stage twiddle is ψ^(n/2), a square root of -1.
        assert_eq!(mod_power(i64::from(table[1]), 2, 17), Ok(16));
    }
}
