use std::process::Command;

use ntt_pipeline::{
    accelerator::{AcceleratorConfig, SoftwarePipeline},
    cmdline_utils::{AcceleratorKind, InputPattern},
    errors::ConfigError,
    harness::{generate_input, Harness},
    parameters::{NttParameters, RunConfig, Topology, DEFAULT_B, DEFAULT_BITS, DEFAULT_MODULUS, DEFAULT_N, DEFAULT_NUM_CH},
    verify::Verdict,
};

fn default_config(samples: usize) -> RunConfig {
    let params = NttParameters::new(DEFAULT_N, u64::from(DEFAULT_MODULUS), DEFAULT_B, None).unwrap();
    let topology = Topology::from_memory_layout(DEFAULT_NUM_CH, DEFAULT_BITS, DEFAULT_B).unwrap();
    RunConfig::new(params, topology, samples).unwrap()
}

#[test]
fn default_configuration_passes() {
    let config = default_config(16);
    assert_eq!(config.topology, Topology::new(4, 1, 16).unwrap());
    let accelerator = AcceleratorConfig::select(AcceleratorKind::Auto, "", "ntt-runner".into(), Vec::new())
        .unwrap()
        .build(&config)
        .unwrap();

    let harness = Harness::new(config).unwrap();
    for pattern in [InputPattern::Sequential, InputPattern::Random] {
        let input = generate_input(&config, pattern, 42);
        let outcome = harness.run(accelerator.as_ref(), &input).unwrap();
        assert_eq!(outcome.verdict, Verdict::Passed, "{pattern}");
    }
}

#[test]
fn every_butterfly_count_passes() {
    // From B = 1 (all but one stage in software) to B = n (all in the pipeline).
    for b in [1, 2, 4, 8, 16, 32, 64] {
        let params = NttParameters::new(64, 257, b, None).unwrap();
        let config = RunConfig::new(params, Topology::new(2, 2, 4).unwrap(), 8).unwrap();
        let harness = Harness::new(config).unwrap();
        let input = generate_input(&config, InputPattern::Random, b as u64);
        let outcome = harness
            .run(&SoftwarePipeline::new(&config).unwrap(), &input)
            .unwrap();
        assert!(outcome.verdict.passed(), "B = {b}: {}", outcome.verdict);
    }
}

#[test]
fn batch_must_divide_across_cores() {
    let params = NttParameters::new(DEFAULT_N, u64::from(DEFAULT_MODULUS), DEFAULT_B, None).unwrap();
    let topology = Topology::from_memory_layout(DEFAULT_NUM_CH, DEFAULT_BITS, DEFAULT_B).unwrap();
    assert_eq!(
        RunConfig::new(params, topology, 1001),
        Err(ConfigError::BatchNotDivisible {
            samples: 1001,
            num_core: 4
        })
    );
}

fn main_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_main"))
}

#[test]
fn cli_reports_pass() {
    let output = main_binary()
        .args(["4", "-n", "8", "-q", "17", "-B", "2", "--num-ch", "2", "--bits", "128"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "PASSED!");
}

#[test]
fn cli_rejects_bad_batch() {
    let output = main_binary()
        .args(["3", "-n", "8", "-q", "17", "-B", "2", "--num-ch", "2", "--bits", "128"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn cli_link_config() {
    let output = main_binary().args(["--link-config", "--num-ch", "2", "-B", "16"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "[connectivity]\nsp=ntt_1.x_0:HBM[0]\nsp=ntt_1.x_1:HBM[1]\nsp=ntt_1.y_0:HBM[2]\nsp=ntt_1.y_1:HBM[3]"
    );
}

#[cfg(unix)]
#[test]
fn cli_passes_runner_args() {
    // `sh -c cat` echoes the scattered inputs back, which is not their transform.
    let output = main_binary()
        .args(["4", "-n", "8", "-q", "17", "-B", "2", "--num-ch", "2", "--bits", "128"])
        .args(["--bitstream", "ntt.xclbin", "--runner", "sh", "--runner-arg=-c", "--runner-arg", "cat"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("FAILED! Error count : "));
}
