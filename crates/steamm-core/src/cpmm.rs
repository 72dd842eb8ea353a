//! # Constant Product Quoting
//!
//! Swap quotes on the curve `(x + offset) * (y + offset) = k`. The offset is a
//! virtual reserve added to both sides; with `offset == 0` this is plain
//! `x * y = k`. All intermediate products are taken in 128 bits.
//!
//! The output is always floored against the exact real-valued result, so the
//! invariant `k` never decreases across a quoted swap.

use tracing::debug;

use crate::constants::{BPS_DENOMINATOR, MAX_BPS};
use crate::errors::{CoreResult, SteammError};
use crate::fees::SwapFeeConfig;
use crate::math::{
    div_round_u128, safe_add_u128, safe_add_u64, safe_cast_u128_to_u64, safe_mul_u128,
    safe_sub_u128, safe_sub_u64, Rounding,
};
use crate::types::SwapQuote;

/// Invariant `(reserve_a + offset) * (reserve_b + offset)`
pub fn k(reserve_a: u64, reserve_b: u64, offset: u64) -> CoreResult<u128> {
    let virtual_a = reserve_a as u128 + offset as u128;
    let virtual_b = reserve_b as u128 + offset as u128;
    safe_mul_u128(virtual_a, virtual_b)
}

/// Quote a swap of `amount_in` against the given reserves.
///
/// Fees are taken from the input before it moves the curve.
pub fn quote_swap(
    reserve_a: u64,
    reserve_b: u64,
    amount_in: u64,
    offset: u64,
    a2b: bool,
    fees: &SwapFeeConfig,
) -> CoreResult<SwapQuote> {
    let (reserve_in, reserve_out) = if a2b {
        (reserve_a, reserve_b)
    } else {
        (reserve_b, reserve_a)
    };

    let (protocol_fees, pool_fees) = fees.compute_swap_fees(amount_in)?;
    let fee_amount = safe_add_u64(protocol_fees, pool_fees)?;
    if fee_amount >= amount_in {
        return Err(SteammError::InsufficientInput);
    }
    let amount_in_after_fee = safe_sub_u64(amount_in, fee_amount)?;

    let amount_out = amount_out_for(reserve_in, reserve_out, amount_in_after_fee, offset)?;
    if amount_out == 0 {
        return Err(SteammError::InsufficientLiquidity);
    }
    assert_liquidity(reserve_out, amount_out)?;

    debug!(
        reserve_in,
        reserve_out,
        offset,
        amount_in,
        amount_out,
        protocol_fees,
        pool_fees,
        a2b,
        "quoted swap"
    );

    Ok(SwapQuote {
        amount_in,
        amount_out,
        protocol_fees,
        pool_fees,
        a2b,
    })
}

/// Output for a fee-free input: `reserve_out + offset - ceil(k / (reserve_in + amount_in + offset))`
pub fn amount_out_for(reserve_in: u64, reserve_out: u64, amount_in: u64, offset: u64) -> CoreResult<u64> {
    let k = k(reserve_in, reserve_out, offset)?;

    let new_virtual_in = safe_add_u128(
        reserve_in as u128 + offset as u128,
        amount_in as u128,
    )?;
    if new_virtual_in == 0 {
        return Ok(0);
    }

    // Rounding the remaining output reserve up floors the amount paid out
    let new_virtual_out = div_round_u128(k, new_virtual_in, Rounding::Up)?;
    let virtual_out = reserve_out as u128 + offset as u128;
    let amount_out = safe_sub_u128(virtual_out, new_virtual_out)?;

    safe_cast_u128_to_u64(amount_out)
}

/// Fail unless the pool keeps a non-empty output reserve
pub fn assert_liquidity(reserve_out: u64, amount_out: u64) -> CoreResult<()> {
    if amount_out >= reserve_out {
        return Err(SteammError::InsufficientLiquidity);
    }
    Ok(())
}

/// Fail if the invariant dropped below `k0`
pub fn check_invariance(k0: u128, reserve_a: u64, reserve_b: u64, offset: u64) -> CoreResult<()> {
    let k1 = k(reserve_a, reserve_b, offset)?;
    if k1 < k0 {
        return Err(SteammError::InvariantViolation { before: k0, after: k1 });
    }
    Ok(())
}

/// Largest A->B input worth quoting, or `None` when the curve cannot be drained.
///
/// With a positive offset the virtual curve would pay out the entire real B
/// reserve at an input of `(reserve_a + offset) * reserve_b / offset`. The
/// returned bound sits `safety_margin_bps` below that point so callers can
/// clamp trade sizes before quoting instead of hitting
/// [`SteammError::InsufficientLiquidity`]. Fees only shrink the effective
/// input, so the bound stays conservative for gross amounts.
pub fn max_amount_in_on_a2b(
    reserve_a: u64,
    reserve_b: u64,
    offset: u64,
    safety_margin_bps: u16,
) -> CoreResult<Option<u64>> {
    if safety_margin_bps > MAX_BPS {
        return Err(SteammError::config(format!(
            "safety margin {} bps exceeds {}",
            safety_margin_bps, MAX_BPS
        )));
    }
    if offset == 0 {
        return Ok(None);
    }

    let virtual_a = reserve_a as u128 + offset as u128;
    let drain_point = match virtual_a.checked_mul(reserve_b as u128) {
        Some(product) => product / offset as u128,
        None => u128::MAX,
    };
    let drain_point = drain_point.min(u64::MAX as u128);

    let keep_bps = (BPS_DENOMINATOR - safety_margin_bps as u64) as u128;
    let bounded = drain_point * keep_bps / BPS_DENOMINATOR as u128;

    safe_cast_u128_to_u64(bounded).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FeeConfig;

    fn fees(bps: u64, protocol_share_bps: u16) -> SwapFeeConfig {
        SwapFeeConfig::new(FeeConfig::from_bps(bps, 0).unwrap(), protocol_share_bps).unwrap()
    }

    #[test]
    fn test_quote_swap_reference_values() {
        let quote = quote_swap(1_000_000, 1_000_000, 1_000, 0, true, &fees(30, 0)).unwrap();

        // fee = 3, new reserve in = 1_000_997, ceil(1e12 / 1_000_997) = 999_004
        assert_eq!(quote.total_fees(), 3);
        assert_eq!(quote.amount_out, 996);
        assert_eq!(quote.amount_in, 1_000);
        assert!(quote.a2b);
    }

    #[test]
    fn test_quote_swap_fee_split() {
        let quote = quote_swap(1_000_000, 1_000_000, 100_000, 0, false, &fees(100, 2_000)).unwrap();
        assert_eq!(quote.protocol_fees, 200);
        assert_eq!(quote.pool_fees, 800);
        assert!(!quote.a2b);
    }

    #[test]
    fn test_quote_swap_direction() {
        let a2b = quote_swap(1_000_000, 2_000_000, 10_000, 0, true, &fees(0, 0)).unwrap();
        let b2a = quote_swap(2_000_000, 1_000_000, 10_000, 0, false, &fees(0, 0)).unwrap();
        assert_eq!(a2b.amount_out, b2a.amount_out);
    }

    #[test]
    fn test_quote_swap_zero_and_dust_inputs() {
        assert_eq!(
            quote_swap(1_000, 1_000, 0, 0, true, &fees(30, 0)),
            Err(SteammError::InsufficientInput)
        );
        // One unit pays a one unit fee
        assert_eq!(
            quote_swap(1_000, 1_000, 1, 0, true, &fees(30, 0)),
            Err(SteammError::InsufficientInput)
        );
    }

    #[test]
    fn test_quote_swap_zero_output() {
        // 1 unit into a deep pool rounds to nothing
        assert_eq!(
            quote_swap(1_000_000, 10, 1, 0, true, &fees(0, 0)),
            Err(SteammError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_quote_swap_empty_pool() {
        assert_eq!(
            quote_swap(0, 0, 1_000, 0, true, &fees(30, 0)),
            Err(SteammError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_offset_cannot_drain_real_reserve() {
        // A large offset makes the curve nearly flat; a big input would
        // otherwise pay out more than the real reserve
        assert_eq!(
            quote_swap(100, 100, 1_000, 1_000_000, true, &fees(0, 0)),
            Err(SteammError::InsufficientLiquidity)
        );
        let quote = quote_swap(100, 100, 50, 1_000_000, true, &fees(0, 0)).unwrap();
        assert_eq!(quote.amount_out, 49);
    }

    #[test]
    fn test_invariant_holds_after_swap() {
        let (ra, rb, offset) = (5_000_000u64, 3_000_000u64, 250_000u64);
        let k0 = k(ra, rb, offset).unwrap();
        let quote = quote_swap(ra, rb, 77_777, offset, true, &fees(25, 0)).unwrap();

        let new_a = ra + quote.amount_in_net().unwrap();
        let new_b = rb - quote.amount_out;
        check_invariance(k0, new_a, new_b, offset).unwrap();
    }

    #[test]
    fn test_check_invariance_rejects_decrease() {
        let k0 = k(100, 100, 0).unwrap();
        assert_eq!(
            check_invariance(k0, 100, 99, 0),
            Err(SteammError::InvariantViolation { before: 10_000, after: 9_900 })
        );
    }

    #[test]
    fn test_max_amount_in_on_a2b() {
        assert_eq!(max_amount_in_on_a2b(1_000, 1_000, 0, 100).unwrap(), None);

        // drain point = (100 + 100) * 100 / 100 = 200
        assert_eq!(max_amount_in_on_a2b(100, 100, 100, 0).unwrap(), Some(200));
        assert_eq!(max_amount_in_on_a2b(100, 100, 100, 1_000).unwrap(), Some(180));

        let bound = max_amount_in_on_a2b(100, 100, 100, 1_000).unwrap().unwrap();
        assert!(quote_swap(100, 100, bound, 100, true, &fees(0, 0)).is_ok());
        assert!(quote_swap(100, 100, 200, 100, true, &fees(0, 0)).is_err());

        assert!(max_amount_in_on_a2b(1, 1, 1, 10_001).is_err());
    }

    #[test]
    fn test_max_amount_in_clamps_to_u64() {
        let bound = max_amount_in_on_a2b(u64::MAX, u64::MAX, 1, 0).unwrap();
        assert_eq!(bound, Some(u64::MAX));
    }
}
