//! End-to-end equivalence run: reference transform on the host, the same batch
//! through an accelerator, and an elementwise comparison of the two.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
    time::{Duration, Instant},
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

use crate::{
    accelerator::Accelerator,
    cmdline_utils::{AcceleratorKind, InputPattern},
    errors::{AcceleratorError, Error},
    layout::ChannelLayout,
    ntt::{bit_reverse_batch, OmegaMatrix, ReferenceTransform, Residue},
    parameters::RunConfig,
    verify::Verdict,
};

/// Builds a linear batch of `SAMPLES * n` residues.
pub fn generate_input(config: &RunConfig, pattern: InputPattern, seed: u64) -> Vec<Residue> {
    let q = config.params.modulus;
    match pattern {
        InputPattern::Sequential => (0..config.batch_len())
            .map(|i| (i as u64 % u64::from(q)) as Residue)
            .collect(),
        InputPattern::Random => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..config.batch_len()).map(|_| rng.gen_range(0..q)).collect()
        }
    }
}

/// What one comparison produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub verdict: Verdict,
    pub reference_time: Duration,
    pub kernel_time: Duration,
    /// Accelerator output, gathered and in natural order.
    pub output: Vec<Residue>,
}

pub struct Harness {
    config: RunConfig,
    layout: ChannelLayout,
    omega: OmegaMatrix,
}

impl Harness {
    pub fn new(config: RunConfig) -> Result<Self, Error> {
        Ok(Self {
            layout: ChannelLayout::new(&config),
            omega: OmegaMatrix::new(&config.params)?,
            config,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Matrix-form transform of every sample.
    pub fn reference(&self, input: &[Residue]) -> Vec<Residue> {
        let mut expected = vec![0; input.len()];
        ReferenceTransform::new(&self.config.params, &self.omega).transform(input, &mut expected);
        expected
    }

    /// Runs `input` through `accelerator` and compares against the reference.
    ///
    /// A mismatch is not an error; it shows up in the verdict.
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(samples = self.config.samples)))]
    pub fn run(&self, accelerator: &dyn Accelerator, input: &[Residue]) -> Result<RunOutcome, Error> {
        assert_eq!(input.len(), self.config.batch_len());

        let start = Instant::now();
        let expected = self.reference(input);
        let reference_time = start.elapsed();
        #[cfg(feature = "tracing")]
        debug!(?reference_time, "reference transform done");

        let mut channels = self.layout.new_channels();
        self.layout.scatter(input, &mut channels);
        let run = accelerator.transform_batch(&channels, self.config.batch_count())?;
        if !run.outputs.same_shape(&channels) {
            return Err(AcceleratorError::Shape {
                expected: channels.num_channels(),
                len: channels.channel_len(),
                actual_channels: run.outputs.num_channels(),
                actual_len: run.outputs.channel_len(),
            }
            .into());
        }
        #[cfg(feature = "tracing")]
        debug!(kernel_time = ?run.elapsed, "accelerator done");

        let mut gathered = vec![0; input.len()];
        self.layout.gather(&run.outputs, &mut gathered);
        let mut output = vec![0; input.len()];
        bit_reverse_batch(&gathered, &mut output, self.config.params.n);

        Ok(RunOutcome {
            verdict: Verdict::compare(&expected, &output),
            reference_time,
            kernel_time: run.elapsed,
            output,
        })
    }
}

/// One line of the JSON run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub config: RunConfig,
    pub input: InputPattern,
    pub seed: Option<u64>,
    pub accelerator: AcceleratorKind,
    pub reference_time: Duration,
    pub kernel_time: Duration,
    pub mismatches: usize,
    pub passed: bool,
}

impl RunReport {
    pub fn new(
        config: RunConfig,
        input: InputPattern,
        seed: u64,
        accelerator: AcceleratorKind,
        outcome: &RunOutcome,
    ) -> Self {
        Self {
            config,
            input,
            seed: (input == InputPattern::Random).then_some(seed),
            accelerator,
            reference_time: outcome.reference_time,
            kernel_time: outcome.kernel_time,
            mismatches: outcome.verdict.mismatches(),
            passed: outcome.verdict.passed(),
        }
    }

    /// Appends the report as a single JSON line.
    pub fn append_to(&self, path: &Path) -> io::Result<()> {
        let mut out_file = OpenOptions::new().append(true).create(true).open(path)?;
        writeln!(out_file, "{}", serde_json::to_string(self)?)
    }
}
