//! Checked fixed-point helpers over `U256`.
//!
//! Share issuance, redemption and NAV pricing are all ratios of large
//! integers. These helpers make the rounding direction explicit at every
//! call site and turn overflow or a zero denominator into an error.

use alloy_primitives::U256;
use thiserror::Error;

/// Arithmetic failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// An intermediate product or sum did not fit in 256 bits.
    #[error("arithmetic overflow")]
    Overflow,

    /// The denominator was zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// Computes `a * b / denominator`, rounding down.
///
/// # Errors
///
/// Returns [`MathError::DivisionByZero`] if `denominator` is zero and
/// [`MathError::Overflow`] if `a * b` does not fit in 256 bits.
pub fn mul_div_floor(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    Ok(product / denominator)
}

/// Computes `a * b / denominator`, rounding up.
///
/// # Errors
///
/// Same conditions as [`mul_div_floor`].
pub fn mul_div_ceil(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    let quotient = product / denominator;
    if (product % denominator).is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::from(1u64)).ok_or(MathError::Overflow)
    }
}

/// Checked addition.
pub fn add(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}
