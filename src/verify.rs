use std::fmt::Display;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use crate::ntt::Residue;

/// Number of positions where the two batches differ.
pub fn count_mismatches(expected: &[Residue], actual: &[Residue]) -> usize {
    assert_eq!(expected.len(), actual.len());
    #[cfg(not(feature = "parallel"))]
    let iter = expected.iter().zip(actual);
    #[cfg(feature = "parallel")]
    let iter = expected.par_iter().zip(actual);
    iter.filter(|(a, b)| a != b).count()
}

/// Outcome of comparing the pipeline against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed { mismatches: usize },
}

impl Verdict {
    pub fn compare(expected: &[Residue], actual: &[Residue]) -> Self {
        match count_mismatches(expected, actual) {
            0 => Self::Passed,
            mismatches => Self::Failed { mismatches },
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn mismatches(&self) -> usize {
        match self {
            Self::Passed => 0,
            Self::Failed { mismatches } => *mismatches,
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED!"),
            Self::Failed { mismatches } => write!(f, "FAILED! Error count : {mismatches}"),
        }
    }
}
