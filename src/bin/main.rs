use std::{ffi::OsString, path::PathBuf, process::ExitCode};

use clap::Parser;
use ntt_pipeline::{
    accelerator::AcceleratorConfig,
    cmdline_utils::{AcceleratorKind, InputPattern},
    errors::Error,
    harness::{generate_input, Harness, RunReport},
    parameters::{
        NttParameters, RunConfig, Topology, DEFAULT_B, DEFAULT_BITS, DEFAULT_MODULUS, DEFAULT_N,
        DEFAULT_NUM_CH, DEFAULT_SAMPLES,
    },
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of samples in the batch. Must be a multiple of the core count.
    #[arg(default_value_t = DEFAULT_SAMPLES)]
    samples: usize,

    #[arg(short = 'n', long = "size", default_value_t = DEFAULT_N)]
    n: usize,

    #[arg(short = 'q', long = "modulus", default_value_t = u64::from(DEFAULT_MODULUS))]
    modulus: u64,

    /// Primitive 2n-th root of unity. Searched for when omitted.
    #[arg(long)]
    psi: Option<u32>,

    /// Butterfly units working in parallel.
    #[arg(short = 'B', long = "butterflies", default_value_t = DEFAULT_B)]
    b: usize,

    #[arg(short = 'c', long = "num-ch", default_value_t = DEFAULT_NUM_CH)]
    num_ch: usize,

    #[arg(long, default_value_t = DEFAULT_BITS)]
    bits: usize,

    #[arg(short = 'a', long, default_value = "Auto")]
    accelerator: AcceleratorKind,

    /// Device bitstream. Empty runs the software simulation.
    #[arg(long, default_value = "")]
    bitstream: String,

    /// Program that loads the bitstream and drives the device.
    #[arg(long, default_value = "ntt-runner")]
    runner: PathBuf,

    /// Extra argument for the runner. Repeat for several.
    #[arg(long = "runner-arg", allow_hyphen_values = true)]
    runner_args: Vec<OsString>,

    #[arg(short = 'i', long = "input", default_value = "Sequential")]
    input: InputPattern,

    #[arg(short = 's', long, default_value = "0")]
    seed: u64,

    /// Append a JSON report line to this file.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print the memory connectivity for the kernel link step and exit.
    #[arg(long)]
    link_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!("{err}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<bool, Error> {
    let params = NttParameters::new(args.n, args.modulus, args.b, args.psi)?;
    let topology = Topology::from_memory_layout(args.num_ch, args.bits, args.b)?;
    if args.link_config {
        println!("{}", topology.link_config()?);
        return Ok(true);
    }
    let config = RunConfig::new(params, topology, args.samples)?;
    let accelerator = AcceleratorConfig::select(
        args.accelerator,
        &args.bitstream,
        args.runner.clone(),
        args.runner_args.clone(),
    )?;

    for line in config.to_string().lines() {
        info!("{line}");
    }
    info!(
        accelerator = ?accelerator.kind(),
        software_stages = params.software_stages(),
        last_stride = params.last_stride(),
        "input: {}",
        args.input
    );

    let harness = Harness::new(config)?;
    let input = generate_input(&config, args.input, args.seed);
    let outcome = harness.run(accelerator.build(&config)?.as_ref(), &input)?;
    info!(
        reference_time = ?outcome.reference_time,
        kernel_time = ?outcome.kernel_time,
        "run complete"
    );

    println!("{}", outcome.verdict);

    if let Some(path) = &args.json {
        RunReport::new(config, args.input, args.seed, accelerator.kind(), &outcome).append_to(path)?;
        info!("report appended to {}", path.display());
    }
    Ok(outcome.verdict.passed())
}
