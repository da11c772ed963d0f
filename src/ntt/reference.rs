//! Direct matrix-form NTT, `O(n²)` per sample. Used as the oracle.

#[cfg(feature = "tracing")]
use tracing::instrument;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{twiddles::OmegaMatrix, Residue};
use crate::{parameters::NttParameters, utils::num_chunks};

pub struct ReferenceTransform<'a> {
    params: &'a NttParameters,
    omega: &'a OmegaMatrix,
}

impl<'a> ReferenceTransform<'a> {
    pub fn new(params: &'a NttParameters, omega: &'a OmegaMatrix) -> Self {
        assert_eq!(omega.size(), params.n);
        Self { params, omega }
    }

    /// `out[j] = Σ_k Omega[j][k] * in[k] mod q` for one sample.
    pub fn transform_sample(&self, input: &[Residue], output: &mut [Residue]) {
        let q = u64::from(self.params.modulus);
        for (j, out) in output.iter_mut().enumerate() {
            *out = self
                .omega
                .row(j)
                .iter()
                .zip(input)
                .fold(0_u64, |sum, (&w, &x)| (sum + u64::from(w) * u64::from(x)) % q)
                as Residue;
        }
    }

    /// Transforms every sample of a batch. Samples are independent, so they are
    /// processed in parallel with no shared state.
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(samples = input.len() / self.params.n)))]
    pub fn transform(&self, input: &[Residue], output: &mut [Residue]) {
        let n = self.params.n;
        assert_eq!(input.len(), output.len());
        num_chunks(input, n);

        #[cfg(not(feature = "parallel"))]
        input
            .chunks_exact(n)
            .zip(output.chunks_exact_mut(n))
            .for_each(|(src, dst)| self.transform_sample(src, dst));
        #[cfg(feature = "parallel")]
        input
            .par_chunks_exact(n)
            .zip(output.par_chunks_exact_mut(n))
            .for_each(|(src, dst)| self.transform_sample(src, dst));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ntt::modular::mod_power;

    #[test]
    fn test_reference_small() {
        let params = NttParameters::new(8, 17, 1, Some(3)).unwrap();
        let omega = OmegaMatrix::new(&params).unwrap();
        let input: Vec<Residue> = (0..8).collect();
        let mut output = vec![0; 8];
        ReferenceTransform::new(&params, &omega).transform(&input, &mut output);
        assert_eq!(output, vec![6, 13, 5, 12, 8, 0, 2, 5]);
    }

    #[test]
    fn test_reference_evaluates_at_odd_powers() {
        // out[j] is the input polynomial evaluated at ψ^(2j + 1).
        let params = NttParameters::new(16, 97, 2, None).unwrap();
        let omega = OmegaMatrix::new(&params).unwrap();
        let input: Vec<Residue> = (0..16).map(|i| (i * i + 1) % 97).collect();
        let mut output = vec![0; 16];
        ReferenceTransform::new(&params, &omega).transform(&input, &mut output);

        for (j, &value) in output.iter().enumerate() {
            let point = mod_power(i64::from(params.psi), 2 * j as u64 + 1, 97).unwrap();
            let mut acc = 0_u64;
            for &coeff in input.iter().rev() {
                acc = (acc * point + u64::from(coeff)) % 97;
            }
            assert_eq!(u64::from(value), acc, "Mismatch at j={j}");
        }
    }

    #[test]
    fn test_reference_samples_independent() {
        let params = NttParameters::new(8, 17, 1, Some(3)).unwrap();
        let omega = OmegaMatrix::new(&params).unwrap();
        let reference = ReferenceTransform::new(&params, &omega);

        let first: Vec<Residue> = (0..8).collect();
        let second: Vec<Residue> = vec![16, 0, 3, 3, 9, 1, 0, 12];
        let batch: Vec<Residue> = first.iter().chain(&second).copied().collect();

        let mut out_batch = vec![0; 16];
        reference.transform(&batch, &mut out_batch);
        let mut out_second = vec![0; 8];
        reference.transform_sample(&second, &mut out_second);

        assert_eq!(&out_batch[..8], &[6, 13, 5, 12, 8, 0, 2, 5]);
        assert_eq!(&out_batch[8..], out_second.as_slice());
    }

    #[test]
    fn test_reference_delta() {
        // The transform of the constant polynomial 1 is all ones.
        let params = NttParameters::new(32, 193, 4, None).unwrap();
        let omega = OmegaMatrix::new(&params).unwrap();
        let mut input = vec![0; 32];
        input[0] = 1;
        let mut output = vec![0; 32];
        ReferenceTransform::new(&params, &omega).transform(&input, &mut output);
        assert!(output.iter().all(|&v| v == 1));
    }
}
