use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    errors::ConfigError,
    ntt::modular::{find_psi, is_prime, is_primitive_psi},
    utils::is_power_of_two,
};

/// Transform size used when none is specified.
pub const DEFAULT_N: usize = 1024;
/// Default NTT-friendly prime (`2 * 1024` divides `12289 - 1`).
pub const DEFAULT_MODULUS: u32 = 12289;
/// Default coefficient width in bits.
pub const DEFAULT_BITS: usize = 32;
/// Default number of butterfly units working in parallel.
pub const DEFAULT_B: usize = 8;
/// Default number of input memory channels.
pub const DEFAULT_NUM_CH: usize = 4;
/// Default batch size.
pub const DEFAULT_SAMPLES: usize = 1000;
/// Width of one memory channel word.
pub const MEMORY_BUS_BITS: usize = 512;
/// Largest number of memory channels that can be connected.
pub const MAX_CHANNELS: usize = 16;

/// Transform-level constants: modulus, root and sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NttParameters {
    pub modulus: u32,
    /// Primitive `2n`-th root of unity.
    pub psi: u32,
    pub n: usize,
    pub log_n: usize,
    /// Number of butterfly lanes resolved by the pipeline.
    pub b: usize,
    pub log_b: usize,
}

impl NttParameters {
    /// Validates the transform constants. When `psi` is `None` the smallest
    /// primitive `2n`-th root of unity is used.
    pub fn new(n: usize, modulus: u64, b: usize, psi: Option<u32>) -> Result<Self, ConfigError> {
        if !is_power_of_two(n) {
            return Err(ConfigError::NotPowerOfTwo { name: "n", value: n });
        }
        if n < 2 {
            return Err(ConfigError::SizeTooSmall(n));
        }
        if !is_power_of_two(b) {
            return Err(ConfigError::NotPowerOfTwo { name: "B", value: b });
        }
        if b > n {
            return Err(ConfigError::ParallelismTooLarge { b, n });
        }
        let modulus = u32::try_from(modulus)
            .ok()
            .filter(|&q| q > 1)
            .ok_or(ConfigError::ModulusOutOfRange(modulus))?;
        if !is_prime(modulus) {
            return Err(ConfigError::ModulusNotPrime(modulus));
        }
        let psi = match psi {
            Some(psi) => {
                if psi >= modulus || !is_primitive_psi(psi, n, modulus)? {
                    return Err(ConfigError::InvalidRoot {
                        psi,
                        order: 2 * n,
                        q: modulus,
                    });
                }
                psi
            }
            None => find_psi(n, modulus)?,
        };

        Ok(Self {
            modulus,
            psi,
            n,
            log_n: n.trailing_zeros() as usize,
            b,
            log_b: b.trailing_zeros() as usize,
        })
    }

    /// Number of butterfly stages computed before the pipeline's block stages,
    /// `L - Lb - 1`, clamped at zero.
    pub const fn software_stages(&self) -> usize {
        self.log_n.saturating_sub(self.log_b + 1)
    }

    /// Butterfly stride at the boundary between software and pipeline stages.
    pub const fn last_stride(&self) -> usize {
        self.n >> self.software_stages()
    }
}

impl Display for NttParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n: {} mod: {} psi: {}, butterfly units in parallel: {}",
            self.n, self.modulus, self.psi, self.b
        )
    }
}

/// Channel topology of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub num_core: usize,
    pub ch_per_core: usize,
    /// Residues moved per memory word.
    pub vec_len: usize,
}

impl Topology {
    pub const fn new(num_core: usize, ch_per_core: usize, vec_len: usize) -> Result<Self, ConfigError> {
        if num_core == 0 {
            return Err(ConfigError::ZeroTopology { name: "NUM_CORE" });
        }
        if ch_per_core == 0 {
            return Err(ConfigError::ZeroTopology {
                name: "NUM_CH_PER_CORE",
            });
        }
        if vec_len == 0 || vec_len % 2 != 0 {
            return Err(ConfigError::OddLaneWidth(vec_len));
        }
        Ok(Self {
            num_core,
            ch_per_core,
            vec_len,
        })
    }

    /// Derives the core count from the memory layout: each core consumes `2B`
    /// residues per cycle and every channel word carries `512 / bits` residues.
    pub fn from_memory_layout(num_ch: usize, bits: usize, b: usize) -> Result<Self, ConfigError> {
        if bits == 0 || MEMORY_BUS_BITS % bits != 0 {
            return Err(ConfigError::InvalidBitWidth(bits));
        }
        let vec_len = MEMORY_BUS_BITS / bits;
        let butterflies = 2 * b;
        if num_ch == 0 || (num_ch * vec_len) % butterflies != 0 || butterflies % vec_len != 0 {
            return Err(ConfigError::Unrealizable {
                num_ch,
                vec_len,
                butterflies,
            });
        }
        Self::new(num_ch * vec_len / butterflies, butterflies / vec_len, vec_len)
    }

    pub const fn num_ch(&self) -> usize {
        self.num_core * self.ch_per_core
    }

    /// Renders the memory connectivity section for the kernel link step:
    /// inputs on the first `NUM_CH` HBM banks, outputs on the next `NUM_CH`.
    pub fn link_config(&self) -> Result<String, ConfigError> {
        let num_ch = self.num_ch();
        if !(1..=MAX_CHANNELS).contains(&num_ch) {
            return Err(ConfigError::ChannelCount(num_ch));
        }
        let mut out = String::from("[connectivity]");
        for i in 0..num_ch {
            out.push_str(&format!("\nsp=ntt_1.x_{i}:HBM[{i}]"));
        }
        for i in 0..num_ch {
            out.push_str(&format!("\nsp=ntt_1.y_{i}:HBM[{}]", i + num_ch));
        }
        Ok(out)
    }
}

/// Everything fixed for the lifetime of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub params: NttParameters,
    pub topology: Topology,
    pub samples: usize,
}

impl RunConfig {
    pub fn new(params: NttParameters, topology: Topology, samples: usize) -> Result<Self, ConfigError> {
        let half = params.n / 2;
        let group = topology.ch_per_core * topology.vec_len;
        if half % group != 0 {
            return Err(ConfigError::LaneGrouping {
                ch_per_core: topology.ch_per_core,
                vec_len: topology.vec_len,
                half,
            });
        }
        if samples == 0 {
            return Err(ConfigError::EmptyBatch);
        }
        if samples % topology.num_core != 0 {
            return Err(ConfigError::BatchNotDivisible {
                samples,
                num_core: topology.num_core,
            });
        }
        Ok(Self {
            params,
            topology,
            samples,
        })
    }

    /// Length of a linear batch buffer.
    pub const fn batch_len(&self) -> usize {
        self.samples * self.params.n
    }

    /// Length of every channel buffer.
    pub const fn channel_len(&self) -> usize {
        self.batch_len() / self.topology.num_ch()
    }

    /// Number of sample groups each core processes, passed to the accelerator.
    pub const fn batch_count(&self) -> usize {
        self.samples / self.topology.num_core
    }
}

impl Display for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.params)?;
        write!(
            f,
            "samples: {}, memory channels: {}, NTT cores: {}, channels per core: {}, lane width: {}",
            self.samples,
            self.topology.num_ch(),
            self.topology.num_core,
            self.topology.ch_per_core,
            self.topology.vec_len
        )
    }
}
