//! # Liquidity Math
//!
//! Proportional minting and burning of LP shares. Every division floors, so a
//! depositor never receives more shares than their contribution is worth and a
//! redeemer never withdraws more than their shares are worth; rounding error
//! always accrues to the remaining LPs.

use tracing::debug;

use crate::constants::MINIMUM_LIQUIDITY;
use crate::errors::{CoreResult, SteammError};
use crate::fees::{compute_fee, FeeConfig};
use crate::math::{
    div_round_u128, isqrt_u128, mul_div_u64, safe_cast_u128_to_u64, safe_sub_u64, Rounding,
};
use crate::types::{DepositQuote, RedeemQuote};

/// Quote a deposit of at most `max_a` and `max_b`.
///
/// The first deposit sets the price and mints `isqrt(a * b) - MINIMUM_LIQUIDITY`
/// shares; the floor is locked in the supply by the settlement step. Later
/// deposits are trimmed to the current reserve ratio on the non-binding side.
pub fn quote_deposit(
    reserve_a: u64,
    reserve_b: u64,
    lp_supply: u64,
    max_a: u64,
    max_b: u64,
) -> CoreResult<DepositQuote> {
    if lp_supply == 0 {
        return quote_initial_deposit(max_a, max_b);
    }

    if reserve_a == 0 || reserve_b == 0 {
        return Err(SteammError::InsufficientLiquidity);
    }

    let ideal_b = div_round_u128(
        max_a as u128 * reserve_b as u128,
        reserve_a as u128,
        Rounding::Down,
    )?;

    let (deposit_a, deposit_b) = if ideal_b <= max_b as u128 {
        (max_a, safe_cast_u128_to_u64(ideal_b)?)
    } else {
        let ideal_a = mul_div_u64(max_b, reserve_a, reserve_b, Rounding::Down)?;
        (ideal_a, max_b)
    };

    let lp_from_a = mul_div_u64(lp_supply, deposit_a, reserve_a, Rounding::Down)?;
    let lp_from_b = mul_div_u64(lp_supply, deposit_b, reserve_b, Rounding::Down)?;
    let mint_lp = lp_from_a.min(lp_from_b);

    if mint_lp == 0 {
        return Err(SteammError::InsufficientDeposit);
    }

    debug!(
        reserve_a,
        reserve_b,
        lp_supply,
        deposit_a,
        deposit_b,
        mint_lp,
        "quoted deposit"
    );

    Ok(DepositQuote {
        initial_deposit: false,
        deposit_a,
        deposit_b,
        mint_lp,
    })
}

fn quote_initial_deposit(max_a: u64, max_b: u64) -> CoreResult<DepositQuote> {
    let root = safe_cast_u128_to_u64(isqrt_u128(max_a as u128 * max_b as u128))?;
    if root <= MINIMUM_LIQUIDITY {
        return Err(SteammError::InsufficientInitialLiquidity);
    }
    let mint_lp = root - MINIMUM_LIQUIDITY;

    debug!(max_a, max_b, mint_lp, "quoted initial deposit");

    Ok(DepositQuote {
        initial_deposit: true,
        deposit_a: max_a,
        deposit_b: max_b,
        mint_lp,
    })
}

/// Quote burning `lp_tokens` of `lp_supply`.
///
/// The redemption fee is charged on each side's gross share and kept back;
/// the net amounts must meet `min_a` and `min_b`.
pub fn quote_redeem(
    reserve_a: u64,
    reserve_b: u64,
    lp_supply: u64,
    lp_tokens: u64,
    min_a: u64,
    min_b: u64,
    redemption_fee: &FeeConfig,
) -> CoreResult<RedeemQuote> {
    if lp_tokens == 0 || lp_tokens > lp_supply {
        return Err(SteammError::InsufficientBurn);
    }

    let gross_a = mul_div_u64(reserve_a, lp_tokens, lp_supply, Rounding::Down)?;
    let gross_b = mul_div_u64(reserve_b, lp_tokens, lp_supply, Rounding::Down)?;

    // The minimum fee can never take more than the share itself
    let fees_a = compute_fee(redemption_fee, gross_a)?.min(gross_a);
    let fees_b = compute_fee(redemption_fee, gross_b)?.min(gross_b);

    let withdraw_a = safe_sub_u64(gross_a, fees_a)?;
    let withdraw_b = safe_sub_u64(gross_b, fees_b)?;

    if withdraw_a < min_a || withdraw_b < min_b {
        debug!(withdraw_a, withdraw_b, min_a, min_b, "redeem below minimum output");
        return Err(SteammError::SlippageExceeded);
    }

    debug!(
        reserve_a,
        reserve_b,
        lp_supply,
        lp_tokens,
        withdraw_a,
        withdraw_b,
        fees_a,
        fees_b,
        "quoted redeem"
    );

    Ok(RedeemQuote {
        withdraw_a,
        withdraw_b,
        fees_a,
        fees_b,
        burn_lp: lp_tokens,
    })
}

/// Require `final_reserve_a / final_lp_supply >= initial_reserve_a / initial_lp_supply`.
///
/// Compared by cross-multiplication in 128 bits. A pool without supply has no
/// share price yet, so the check passes trivially.
pub fn assert_lp_supply_reserve_ratio(
    initial_reserve_a: u64,
    initial_lp_supply: u64,
    final_reserve_a: u64,
    final_lp_supply: u64,
) -> CoreResult<()> {
    if initial_lp_supply == 0 {
        return Ok(());
    }

    let final_value = final_reserve_a as u128 * initial_lp_supply as u128;
    let initial_value = initial_reserve_a as u128 * final_lp_supply as u128;

    if final_value < initial_value {
        return Err(SteammError::LpRatioViolation);
    }
    Ok(())
}
