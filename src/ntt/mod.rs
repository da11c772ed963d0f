//! NTT over a runtime prime modulus: the matrix-form oracle, the staged
//! Cooley-Tukey transform and the permutations between their orderings.

pub mod cooley_tukey;
pub mod modular;
pub mod permutation;
pub mod reference;
pub mod twiddles;
mod utils;

/// A residue modulo `q`, always held in `[0, q)`.
pub type Residue = u32;

pub use self::{
    cooley_tukey::{butterfly_stage, StageTable, StagedTransform},
    modular::mod_power,
    permutation::{bit_reverse, bit_reverse_batch, rearrange, rearrange_sample},
    reference::ReferenceTransform,
    twiddles::{OmegaMatrix, TwiddleTable},
};
