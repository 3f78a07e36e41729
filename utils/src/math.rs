//! Cantor pairing: a bijection `N x N -> N` used to derive per-chain
//! virtual keysign heights.
//!
//! `pair(x, y) = (x + y)(x + y + 1) / 2 + y`. Intermediate values are
//! computed in `u128`; a result that does not fit in `u64` is an error.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("cantor pair of ({x}, {y}) overflows u64")]
    PairOverflow { x: u64, y: u64 },
}

pub fn cantor_pair(x: u64, y: u64) -> Result<u64, MathError> {
    let overflow = || MathError::PairOverflow { x, y };
    let s = x as u128 + y as u128;
    let z = s
        .checked_mul(s + 1)
        .map(|t| t / 2)
        .and_then(|t| t.checked_add(y as u128))
        .ok_or_else(overflow)?;
    u64::try_from(z).map_err(|_| overflow())
}

/// Inverse of [`cantor_pair`]. Total over `u64`.
pub fn cantor_unpair(z: u64) -> (u64, u64) {
    let z = z as u128;
    let w = (isqrt(8 * z + 1) - 1) / 2;
    let t = w * (w + 1) / 2;
    let y = z - t;
    let x = w - y;
    (x as u64, y as u64)
}

/// Floor of the square root (Newton's method).
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
