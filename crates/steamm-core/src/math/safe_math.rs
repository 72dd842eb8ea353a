//! # Safe Math Operations
//!
//! Overflow-checked arithmetic with explicit rounding. Balances and reserves
//! never saturate: every helper here fails closed.

use integer_sqrt::IntegerSquareRoot;

use crate::constants::BPS_DENOMINATOR;
use crate::errors::{CoreResult, SteammError};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        /// Checked binary operation returning a core error on overflow/underflow
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };

    // Division operations with zero check
    (div, $fn_name:ident, $type:ty) => {
        /// Safe division with zero check
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            if b == 0 {
                return Err(SteammError::DivisionByZero);
            }
            Ok(a / b)
        }
    };

    // Simple cast with only max check
    (cast_max, $fn_name:ident, $from_type:ty, $to_type:ty, $max_val:expr) => {
        /// Safe narrowing cast
        pub fn $fn_name(value: $from_type) -> CoreResult<$to_type> {
            if value > $max_val {
                return Err(SteammError::ArithmeticOverflow);
            }
            Ok(value as $to_type)
        }
    };
}

// Generate basic arithmetic functions
safe_arith!(safe_add_u64, u64, checked_add, SteammError::ArithmeticOverflow);
safe_arith!(safe_sub_u64, u64, checked_sub, SteammError::ArithmeticUnderflow);

safe_arith!(safe_add_u128, u128, checked_add, SteammError::ArithmeticOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, SteammError::ArithmeticUnderflow);
safe_arith!(safe_mul_u128, u128, checked_mul, SteammError::ArithmeticOverflow);
safe_arith!(div, safe_div_u128, u128);

// Generate type conversion functions
safe_arith!(cast_max, safe_cast_u128_to_u64, u128, u64, u64::MAX as u128);

/// Divide with an explicit rounding direction
pub fn div_round_u128(numerator: u128, denominator: u128, rounding: Rounding) -> CoreResult<u128> {
    let quotient = safe_div_u128(numerator, denominator)?;
    if rounding == Rounding::Up && numerator % denominator != 0 {
        return safe_add_u128(quotient, 1);
    }
    Ok(quotient)
}

/// `a * b / denominator` with a 128-bit intermediate.
///
/// The product of two `u64` values always fits in 128 bits, so only the final
/// narrowing back to `u64` can overflow.
pub fn mul_div_u64(a: u64, b: u64, denominator: u64, rounding: Rounding) -> CoreResult<u64> {
    if denominator == 0 {
        return Err(SteammError::DivisionByZero);
    }
    let product = (a as u128) * (b as u128);
    let result = div_round_u128(product, denominator as u128, rounding)?;
    safe_cast_u128_to_u64(result)
}

/// Apply basis points to an amount, rounding down
pub fn safe_calculate_bps(amount: u64, bps: u64) -> CoreResult<u64> {
    mul_div_u64(amount, bps, BPS_DENOMINATOR, Rounding::Down)
}

/// Integer square root (floor)
pub fn isqrt_u128(n: u128) -> u128 {
    n.integer_sqrt()
}
