use std::{io, process::ExitStatus};

use thiserror::Error;

/// Errors raised by the modular arithmetic primitives.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Modular reduction is only defined for moduli greater than one.
    #[error("modulus must be greater than one, got {0}")]
    InvalidModulus(u64),
}

/// Errors found while validating a run configuration.
///
/// All of these are reported before any transform work starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a power of two, got {value}")]
    NotPowerOfTwo { name: &'static str, value: usize },

    #[error("transform size must be at least 2, got {0}")]
    SizeTooSmall(usize),

    #[error("parallelism factor {b} exceeds transform size {n}")]
    ParallelismTooLarge { b: usize, n: usize },

    #[error("modulus {0} is out of range (must satisfy 1 < q < 2^32)")]
    ModulusOutOfRange(u64),

    #[error("modulus {0} is not prime")]
    ModulusNotPrime(u32),

    #[error("modulus {q} has no primitive {order}-th root of unity")]
    NoPrimitiveRoot { q: u32, order: usize },

    #[error("psi = {psi} does not have exact order {order} modulo {q}")]
    InvalidRoot { psi: u32, order: usize, q: u32 },

    #[error("batch size must be positive")]
    EmptyBatch,

    #[error("batch size {samples} is not a multiple of the core count {num_core}")]
    BatchNotDivisible { samples: usize, num_core: usize },

    #[error("{name} must be positive")]
    ZeroTopology { name: &'static str },

    #[error("vector lane width must be even, got {0}")]
    OddLaneWidth(usize),

    #[error(
        "channels per core ({ch_per_core}) times lane width ({vec_len}) must divide n/2 = {half}"
    )]
    LaneGrouping {
        ch_per_core: usize,
        vec_len: usize,
        half: usize,
    },

    #[error("coefficient width must divide 512 bits, got {0}")]
    InvalidBitWidth(usize),

    #[error(
        "memory layout with {num_ch} channels of {vec_len} lanes cannot feed {butterflies} butterfly lanes"
    )]
    Unrealizable {
        num_ch: usize,
        vec_len: usize,
        butterflies: usize,
    },

    #[error("channel count must be between 1 and 16, got {0}")]
    ChannelCount(usize),

    #[error("the bitstream accelerator needs a bitstream path")]
    MissingBitstream,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Failures of an accelerator invocation. These are fatal for the run.
#[derive(Debug, Error)]
pub enum AcceleratorError {
    #[error("failed to communicate with accelerator runner: {0}")]
    Io(#[from] io::Error),

    #[error("accelerator runner exited with {0}")]
    Exit(ExitStatus),

    #[error("accelerator returned {actual} bytes, expected {expected}")]
    ShortOutput { expected: usize, actual: usize },

    #[error("accelerator configured for {expected} batch steps, asked for {actual}")]
    BatchCount { expected: usize, actual: usize },

    #[error("accelerator expected {expected} channels of {len} residues, got {actual_channels} of {actual_len}")]
    Shape {
        expected: usize,
        len: usize,
        actual_channels: usize,
        actual_len: usize,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Accelerator(#[from] AcceleratorError),

    #[error("failed to write run report: {0}")]
    Report(#[from] io::Error),
}
