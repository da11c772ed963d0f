// checks whether the given number n is a power of two.
pub const fn is_power_of_two(n: usize) -> bool {
    n != 0 && n.is_power_of_two()
}

/// Splits `values` into consecutive samples of `size` residues and checks that
/// nothing is left over.
pub fn num_chunks<T>(values: &[T], size: usize) -> usize {
    assert!(size > 0, "chunk size must be positive");
    assert_eq!(
        values.len() % size,
        0,
        "buffer of length {} is not a whole number of {size}-element samples",
        values.len()
    );
    values.len() / size
}
