pub mod accelerator; // Software and hardware pipelines behind one trait
pub mod cmdline_utils;
pub mod errors;
pub mod harness; // Reference vs accelerator comparison
pub mod layout; // Channel scatter / gather
pub mod ntt;
pub mod parameters; // Run configuration
pub mod utils; // Utils in general
pub mod verify;
