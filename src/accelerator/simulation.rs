//! Software model of the pipeline.
//!
//! Each core unpacks its input words, runs the temporal butterfly stages,
//! regroups every block of `last_stride` coefficients into even and odd
//! halves, and resolves the final `Lb + 1` stages over the regrouped lanes.
//! Results leave the pipeline in bit-reversed order.

use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{Accelerator, KernelRun};
use crate::{
    errors::{AcceleratorError, DomainError},
    layout::{ChannelBuffers, ChannelLayout},
    ntt::{butterfly_stage, rearrange, Residue, StagedTransform, TwiddleTable},
    parameters::{NttParameters, RunConfig},
};

/// Storage position of logical coefficient `p` after the even/odd regrouping
/// of blocks of `last_stride` coefficients.
#[inline]
const fn spatial_lane(p: usize, last_stride: usize) -> usize {
    let (block, offset) = (p / last_stride, p % last_stride);
    block * last_stride + offset / 2 + (offset % 2) * (last_stride / 2)
}

#[derive(Debug, Clone)]
pub struct SoftwarePipeline {
    params: NttParameters,
    layout: ChannelLayout,
    batch_count: usize,
    twiddles: TwiddleTable,
}

impl SoftwarePipeline {
    pub fn new(config: &RunConfig) -> Result<Self, DomainError> {
        Ok(Self {
            params: config.params,
            layout: ChannelLayout::new(config),
            batch_count: config.batch_count(),
            twiddles: TwiddleTable::new(&config.params)?,
        })
    }

    fn check_inputs(&self, inputs: &ChannelBuffers, batch_count: usize) -> Result<(), AcceleratorError> {
        if batch_count != self.batch_count {
            return Err(AcceleratorError::BatchCount {
                expected: self.batch_count,
                actual: batch_count,
            });
        }
        if inputs.num_channels() != self.layout.num_channels()
            || inputs.channel_len() != self.layout.channel_len()
        {
            return Err(AcceleratorError::Shape {
                expected: self.layout.num_channels(),
                len: self.layout.channel_len(),
                actual_channels: inputs.num_channels(),
                actual_len: inputs.channel_len(),
            });
        }
        Ok(())
    }

    /// Runs stages `Lb + 1` from the end on one regrouped sample, writing the
    /// result to `output` in bit-reversed order.
    fn spatial_stages(&self, sample: &mut [Residue], scratch: &mut [Residue], output: &mut [Residue]) {
        let last_stride = self.params.last_stride();
        let lane = |p| spatial_lane(p, last_stride);
        for stage in self.params.software_stages()..self.params.log_n {
            butterfly_stage(
                sample,
                scratch,
                stage,
                self.twiddles.as_slice(),
                self.params.modulus,
                lane,
            );
            sample.swap_with_slice(scratch);
        }
        for (p, out) in output.iter_mut().enumerate() {
            *out = sample[lane(p)];
        }
    }
}

impl Accelerator for SoftwarePipeline {
    #[cfg_attr(
        feature = "tracing",
        instrument(skip_all, fields(channels = inputs.num_channels(), batch_count = batch_count))
    )]
    fn transform_batch(
        &self,
        inputs: &ChannelBuffers,
        batch_count: usize,
    ) -> Result<KernelRun, AcceleratorError> {
        self.check_inputs(inputs, batch_count)?;
        let start = Instant::now();
        let n = self.params.n;

        let mut linear = vec![0; self.layout.batch_len()];
        self.layout.unscatter(inputs, &mut linear);
        let mut temporal = vec![0; linear.len()];
        StagedTransform::new(&self.params, &self.twiddles).partial(&linear, &mut temporal);
        rearrange(&temporal, &mut linear, n, self.params.last_stride());

        let mut result = temporal;
        #[cfg(not(feature = "parallel"))]
        {
            let mut scratch = vec![0; n];
            for (sample, output) in linear.chunks_exact_mut(n).zip(result.chunks_exact_mut(n)) {
                self.spatial_stages(sample, &mut scratch, output);
            }
        }
        #[cfg(feature = "parallel")]
        linear
            .par_chunks_exact_mut(n)
            .zip(result.par_chunks_exact_mut(n))
            .for_each_init(
                || vec![0; n],
                |scratch, (sample, output)| self.spatial_stages(sample, scratch, output),
            );

        let mut outputs = self.layout.new_channels();
        self.layout.ungather(&result, &mut outputs);
        Ok(KernelRun {
            outputs,
            elapsed: start.elapsed(),
        })
    }
}
