//! The pipeline as seen from the host: channel buffers in, channel buffers out.

mod bitstream;
mod simulation;

use std::{ffi::OsString, path::PathBuf, time::Duration};

pub use self::{bitstream::BitstreamAccelerator, simulation::SoftwarePipeline};
use crate::{
    cmdline_utils::AcceleratorKind,
    errors::{AcceleratorError, ConfigError, Error},
    layout::ChannelBuffers,
    parameters::RunConfig,
};

/// Result of one kernel invocation.
#[derive(Debug, Clone)]
pub struct KernelRun {
    pub outputs: ChannelBuffers,
    /// Wall time spent inside the invocation.
    pub elapsed: Duration,
}

/// A batched NTT pipeline.
///
/// `inputs` holds `NUM_CH` pre-scattered channel buffers and `batch_count` is
/// the number of samples each core processes. The call blocks until every
/// output channel is complete; any failure is fatal for the run.
pub trait Accelerator: Send + Sync {
    fn transform_batch(
        &self,
        inputs: &ChannelBuffers,
        batch_count: usize,
    ) -> Result<KernelRun, AcceleratorError>;
}

/// Which accelerator implementation a run uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceleratorConfig {
    /// Software simulation of the pipeline.
    Software,
    /// External runner driving a device loaded with `bitstream`.
    Bitstream {
        runner: PathBuf,
        args: Vec<OsString>,
        bitstream: PathBuf,
    },
}

impl AcceleratorConfig {
    /// Resolves the command line choice. `Auto` runs the software simulation
    /// when `bitstream` is empty and the hardware otherwise. `runner_args` are
    /// only used by the hardware.
    pub fn select(
        kind: AcceleratorKind,
        bitstream: &str,
        runner: PathBuf,
        runner_args: Vec<OsString>,
    ) -> Result<Self, ConfigError> {
        match kind {
            AcceleratorKind::Software => Ok(Self::Software),
            AcceleratorKind::Auto if bitstream.is_empty() => Ok(Self::Software),
            AcceleratorKind::Bitstream if bitstream.is_empty() => Err(ConfigError::MissingBitstream),
            AcceleratorKind::Auto | AcceleratorKind::Bitstream => Ok(Self::Bitstream {
                runner,
                args: runner_args,
                bitstream: PathBuf::from(bitstream),
            }),
        }
    }

    pub fn kind(&self) -> AcceleratorKind {
        match self {
            Self::Software => AcceleratorKind::Software,
            Self::Bitstream { .. } => AcceleratorKind::Bitstream,
        }
    }

    pub fn build(&self, config: &RunConfig) -> Result<Box<dyn Accelerator>, Error> {
        Ok(match self {
            Self::Software => Box::new(SoftwarePipeline::new(config)?),
            Self::Bitstream {
                runner,
                args,
                bitstream,
            } => Box::new(BitstreamAccelerator::new(runner, bitstream).with_args(args.iter().cloned())),
        })
    }
}
