//! Exact arithmetic modulo a runtime prime.
//!
//! Residues are stored as `u32` and products are formed in `u64`, which is wide
//! enough for any `q < 2^32`.

use super::Residue;
use crate::errors::{ConfigError, DomainError};

/// Computes `base^exponent mod modulus`.
///
/// The accumulator is 128 bits wide so no intermediate product can overflow.
/// Negative bases are reduced into `[0, modulus)` first and the result always
/// lies in `[0, modulus)`.
pub fn mod_power(base: i64, exponent: u64, modulus: u64) -> Result<u64, DomainError> {
    if modulus <= 1 {
        return Err(DomainError::InvalidModulus(modulus));
    }
    let modulus = u128::from(modulus);
    let mut base = i128::from(base).rem_euclid(modulus as i128) as u128;
    let mut exponent = exponent;
    let mut result = 1_u128;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exponent >>= 1;
    }
    Ok(result as u64)
}

/// `(a + b) mod q` for reduced operands, with a single conditional subtraction.
#[inline]
pub fn add_mod(a: Residue, b: Residue, q: u32) -> Residue {
    let sum = u64::from(a) + u64::from(b);
    (if sum >= u64::from(q) { sum - u64::from(q) } else { sum }) as Residue
}

/// `(a - b) mod q` for reduced operands, with a single conditional addition.
#[inline]
pub fn sub_mod(a: Residue, b: Residue, q: u32) -> Residue {
    let diff = i64::from(a) - i64::from(b);
    (if diff < 0 { diff + i64::from(q) } else { diff }) as Residue
}

#[inline]
pub fn mul_mod(a: Residue, b: Residue, q: u32) -> Residue {
    (u64::from(a) * u64::from(b) % u64::from(q)) as Residue
}

/// Deterministic primality test by trial division.
pub fn is_prime(q: u32) -> bool {
    let q = u64::from(q);
    if q < 2 {
        return false;
    }
    if q % 2 == 0 {
        return q == 2;
    }
    let mut d = 3_u64;
    while d * d <= q {
        if q % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Checks that `psi` has exact multiplicative order `2n` modulo `q`.
///
/// `n` is a power of two, so this reduces to `psi^n ≡ -1`.
pub fn is_primitive_psi(psi: u32, n: usize, q: u32) -> Result<bool, DomainError> {
    Ok(mod_power(i64::from(psi), n as u64, u64::from(q))? == u64::from(q) - 1)
}

/// Finds the smallest primitive `2n`-th root of unity modulo the prime `q`.
pub fn find_psi(n: usize, q: u32) -> Result<u32, ConfigError> {
    let order = 2 * n;
    if q < 3 || (q as usize - 1) % order != 0 {
        return Err(ConfigError::NoPrimitiveRoot { q, order });
    }
    for candidate in 2..q {
        if is_primitive_psi(candidate, n, q)? {
            return Ok(candidate);
        }
    }
    Err(ConfigError::NoPrimitiveRoot { q, order })
}
