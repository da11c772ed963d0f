#[cfg(feature = "parallel")]
use std::mem::size_of;

/// Target single-thread workload size for `T`.
/// Should ideally be a multiple of a cache line (64 bytes)
/// and close to the L1 cache size (32 KB).
#[cfg(feature = "parallel")]
pub const fn workload_size<T: Sized>() -> usize {
    const CACHE_SIZE: usize = 1 << 15;
    CACHE_SIZE / size_of::<T>()
}

/// Number of whole samples of `size` elements to hand to a single worker.
/// At least one sample, so that samples are never split between workers.
#[cfg(feature = "parallel")]
pub const fn samples_per_task<T: Sized>(size: usize) -> usize {
    let samples = workload_size::<T>() / size;
    if samples == 0 {
        1
    } else {
        samples
    }
}
