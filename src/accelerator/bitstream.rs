//! Hardware pipeline driven through an external runner process.
//!
//! The runner owns the device: it loads the bitstream, moves the channel
//! buffers to and from device memory and launches the kernel. Shape parameters
//! travel in the environment. Input channels are streamed to stdin back to
//! back as little-endian `u32`s; output channels come back on stdout in the
//! same encoding.

use std::{
    ffi::OsString,
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
    time::Instant,
};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

use super::{Accelerator, KernelRun};
use crate::{errors::AcceleratorError, layout::ChannelBuffers, ntt::Residue};

const RESIDUE_BYTES: usize = std::mem::size_of::<Residue>();

#[derive(Debug, Clone)]
pub struct BitstreamAccelerator {
    runner: PathBuf,
    args: Vec<OsString>,
    bitstream: PathBuf,
}

impl BitstreamAccelerator {
    pub fn new(runner: impl AsRef<Path>, bitstream: impl AsRef<Path>) -> Self {
        Self {
            runner: runner.as_ref().to_path_buf(),
            args: Vec::new(),
            bitstream: bitstream.as_ref().to_path_buf(),
        }
    }

    /// Extra arguments passed to the runner on every invocation.
    pub fn with_args(mut self, args: impl IntoIterator<Item = OsString>) -> Self {
        self.args.extend(args);
        self
    }

    fn command(&self, inputs: &ChannelBuffers, batch_count: usize) -> Command {
        let mut command = Command::new(&self.runner);
        command
            .args(&self.args)
            .env("NTT_BITSTREAM", &self.bitstream)
            .env("NTT_NUM_CH", inputs.num_channels().to_string())
            .env("NTT_CHANNEL_LEN", inputs.channel_len().to_string())
            .env("NTT_BATCH_COUNT", batch_count.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        command
    }
}

fn encode(values: &[Residue]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode(bytes: &[u8]) -> Vec<Residue> {
    bytes
        .chunks_exact(RESIDUE_BYTES)
        .map(|chunk| Residue::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

impl Accelerator for BitstreamAccelerator {
    #[cfg_attr(
        feature = "tracing",
        instrument(skip_all, fields(runner = %self.runner.display(), bitstream = %self.bitstream.display()))
    )]
    fn transform_batch(
        &self,
        inputs: &ChannelBuffers,
        batch_count: usize,
    ) -> Result<KernelRun, AcceleratorError> {
        let payload = encode(inputs.as_flat());
        let expected = payload.len();

        let start = Instant::now();
        let mut child = self.command(inputs, batch_count).spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "runner stdin not captured"))?;

        // Feed stdin while stdout drains, otherwise both pipes can fill up.
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(&payload));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked")));
            (output, written)
        });
        let output = output?;
        let elapsed = start.elapsed();

        if !output.status.success() {
            return Err(AcceleratorError::Exit(output.status));
        }
        if output.stdout.len() != expected {
            return Err(AcceleratorError::ShortOutput {
                expected,
                actual: output.stdout.len(),
            });
        }
        written?;

        #[cfg(feature = "tracing")]
        debug!(bytes = expected, ?elapsed, "runner finished");

        Ok(KernelRun {
            outputs: ChannelBuffers::from_flat(decode(&output.stdout), inputs.num_channels()),
            elapsed,
        })
    }
}
