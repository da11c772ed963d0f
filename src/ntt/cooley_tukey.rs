//! Iterative Cooley-Tukey (decimation-in-time) NTT, stopped early.
//!
//! The first `L - Lb - 1` butterfly stages are computed here; the remaining
//! `Lb + 1` stages belong to the pipeline, which resolves `B` butterflies per
//! cycle. Running all `L` stages produces the transform in bit-reversed order.

#[cfg(feature = "tracing")]
use tracing::instrument;
#[cfg(feature = "parallel")]
use {super::utils::samples_per_task, rayon::prelude::*};

use super::{
    modular::{add_mod, mul_mod, sub_mod},
    twiddles::TwiddleTable,
    Residue,
};
use crate::{parameters::NttParameters, utils::num_chunks};

/// Performs butterfly stage `stage` of a size `src.len()` transform, reading
/// `src` and writing `dst`.
///
/// `lane` maps a logical coefficient index to its storage position, which lets
/// callers run the same butterflies over a permuted buffer. Every output is in
/// `[0, q)` provided the inputs are.
pub fn butterfly_stage(
    src: &[Residue],
    dst: &mut [Residue],
    stage: usize,
    twiddles: &[Residue],
    q: u32,
    lane: impl Fn(usize) -> usize,
) {
    let n = src.len();
    assert_eq!(dst.len(), n);
    assert!(n >> (stage + 1) > 0, "stage {stage} out of range for n = {n}");
    let stride = n >> (stage + 1);
    for i in 0..n / 2 {
        let idx_even = (i % stride) + (i / stride) * 2 * stride;
        let idx_odd = idx_even + stride;
        let idx_psi = (i / stride) + n / (2 * stride);

        let (even, odd) = (lane(idx_even), lane(idx_odd));
        let t = mul_mod(src[odd], twiddles[idx_psi], q);
        dst[odd] = sub_mod(src[even], t, q);
        dst[even] = add_mod(src[even], t, q);
    }
}

/// Working storage for one sample: one row of `n` residues per stage boundary.
///
/// Row 0 holds the input, row `s + 1` the output of stage `s`.
#[derive(Debug, Clone)]
pub struct StageTable {
    n: usize,
    rows: usize,
    data: Vec<Residue>,
}

impl StageTable {
    pub fn new(n: usize, stages: usize) -> Self {
        Self {
            n,
            rows: stages + 1,
            data: vec![0; (stages + 1) * n],
        }
    }

    pub fn stages(&self) -> usize {
        self.rows - 1
    }

    pub fn row(&self, row: usize) -> &[Residue] {
        assert!(row < self.rows);
        &self.data[row * self.n..(row + 1) * self.n]
    }

    /// Splits out the input row of stage `stage` and its output row.
    fn stage_rows(&mut self, stage: usize) -> (&[Residue], &mut [Residue]) {
        assert!(stage + 1 < self.rows);
        let (head, tail) = self.data.split_at_mut((stage + 1) * self.n);
        (&head[stage * self.n..], &mut tail[..self.n])
    }
}

/// Batched staged transform over a fixed parameter set.
pub struct StagedTransform<'a> {
    params: &'a NttParameters,
    twiddles: &'a TwiddleTable,
}

impl<'a> StagedTransform<'a> {
    pub fn new(params: &'a NttParameters, twiddles: &'a TwiddleTable) -> Self {
        assert_eq!(twiddles.len(), params.n);
        Self { params, twiddles }
    }

    /// Runs stages `0..table.stages()` on one sample and returns the last row.
    pub fn transform_sample<'t>(&self, input: &[Residue], table: &'t mut StageTable) -> &'t [Residue] {
        let stages = table.stages();
        assert!(stages <= self.params.log_n);
        assert_eq!(input.len(), self.params.n);
        table.data[..self.params.n].copy_from_slice(input);
        for stage in 0..stages {
            let (src, dst) = table.stage_rows(stage);
            butterfly_stage(
                src,
                dst,
                stage,
                self.twiddles.as_slice(),
                self.params.modulus,
                |idx| idx,
            );
        }
        table.row(stages)
    }

    /// Runs the first `stages` butterfly stages on every sample of `input`.
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(samples = input.len() / self.params.n, stages = stages)))]
    pub fn forward_stages(&self, input: &[Residue], output: &mut [Residue], stages: usize) {
        let n = self.params.n;
        assert_eq!(input.len(), output.len());
        assert!(stages <= self.params.log_n, "at most {} stages", self.params.log_n);
        num_chunks(input, n);

        #[cfg(not(feature = "parallel"))]
        {
            let mut table = StageTable::new(n, stages);
            for (src, dst) in input.chunks_exact(n).zip(output.chunks_exact_mut(n)) {
                dst.copy_from_slice(self.transform_sample(src, &mut table));
            }
        }
        #[cfg(feature = "parallel")]
        {
            let chunk = n * samples_per_task::<Residue>(n);
            input
                .par_chunks(chunk)
                .zip(output.par_chunks_mut(chunk))
                .for_each_init(
                    || StageTable::new(n, stages),
                    |table, (src, dst)| {
                        for (src, dst) in src.chunks_exact(n).zip(dst.chunks_exact_mut(n)) {
                            dst.copy_from_slice(self.transform_sample(src, table));
                        }
                    },
                );
        }
    }

    /// The software share of the transform: stages `0..L - Lb - 1`.
    /// With no software stages the input is copied through unchanged.
    pub fn partial(&self, input: &[Residue], output: &mut [Residue]) {
        self.forward_stages(input, output, self.params.software_stages());
    }

    /// All `L` stages. The output of every sample is in bit-reversed order.
    pub fn full(&self, input: &[Residue], output: &mut [Residue]) {
        self.forward_stages(input, output, self.params.log_n);
    }
}
