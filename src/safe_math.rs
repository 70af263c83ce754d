//! Overflow-checked arithmetic over 64-bit signed amounts
//!
//! Every increasing mutation is computed here first and only committed when
//! it fits. Nothing in this module wraps or saturates.

use thiserror::Error;

use crate::core_types::Amount;

/// The computed value would exceed the representable range.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Integer overflow")]
pub struct ArithmeticOverflow;

/// `a + b` for a non-negative increment `b`.
///
/// # Errors
/// [`ArithmeticOverflow`] if the sum exceeds `Amount::MAX`.
#[inline]
pub fn checked_add(a: Amount, b: Amount) -> Result<Amount, ArithmeticOverflow> {
    debug_assert!(b >= 0, "checked_add increment must be non-negative, got {b}");
    a.checked_add(b).ok_or(ArithmeticOverflow)
}

/// `a * b` for strictly positive operands.
///
/// # Errors
/// [`ArithmeticOverflow`] if the product exceeds `Amount::MAX`.
#[inline]
pub fn checked_multiply(a: Amount, b: Amount) -> Result<Amount, ArithmeticOverflow> {
    debug_assert!(a > 0 && b > 0, "checked_multiply needs positive operands, got {a} * {b}");
    a.checked_mul(b).ok_or(ArithmeticOverflow)
}
