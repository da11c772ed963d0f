use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPattern {
    Sequential, // input[i] = i mod q
    Random,     // Uniform in [0, q), seeded
}

impl FromStr for InputPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sequential" | "sequential" => Ok(Self::Sequential),
            "Random" | "random" => Ok(Self::Random),
            _ => Err(format!("Invalid input pattern: {s}")),
        }
    }
}

impl Display for InputPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Random => write!(f, "random"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceleratorKind {
    Auto,      // Software unless a bitstream is given
    Software,  // Software simulation of the pipeline
    Bitstream, // External runner
}

impl FromStr for AcceleratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Auto" | "auto" => Ok(Self::Auto),
            "Software" | "software" | "csim" => Ok(Self::Software),
            "Bitstream" | "bitstream" | "hw" => Ok(Self::Bitstream),
            _ => Err(format!("Invalid accelerator: {s}")),
        }
    }
}
