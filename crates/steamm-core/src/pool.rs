//! # Pool Settlement
//!
//! In-memory constant-product pool that applies quotes to its own reserves,
//! fee balances and trading ledger. Each settling call quotes, re-checks the
//! caller's slippage bound and the pool invariants, and only then writes;
//! a failed call leaves the pool exactly as it was.

use std::fmt;

use tracing::debug;

use crate::config::ProtocolConfig;
use crate::constants::{MAX_BPS, MINIMUM_LIQUIDITY};
use crate::cpmm;
use crate::errors::{CoreResult, SteammError};
use crate::fees::{FeeConfig, Fees, SwapFeeConfig};
use crate::liquidity;
use crate::math::{safe_add_u64, safe_sub_u64};
use crate::types::{DepositQuote, RedeemQuote, SwapQuote, TradingData};

#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(bound = ""))]
pub struct Pool<A, B> {
    reserve_a: u64,
    reserve_b: u64,
    /// Virtual reserve added to both sides of the curve
    offset: u64,
    lp_supply: u64,
    /// Margin kept below the drain point by [`Pool::max_amount_in_on_a2b`]
    max_in_safety_margin_bps: u16,
    swap_fees: SwapFeeConfig,
    protocol_fees: Fees<A, B>,
    redemption_fees: Fees<A, B>,
    trading_data: TradingData,
}

impl<A, B> Pool<A, B> {
    /// Create an empty pool
    pub fn new(
        swap_fees: SwapFeeConfig,
        redemption_fee: FeeConfig,
        offset: u64,
        max_in_safety_margin_bps: u16,
    ) -> CoreResult<Self> {
        swap_fees.validate()?;
        redemption_fee.validate()?;
        validate_safety_margin(max_in_safety_margin_bps)?;

        Ok(Self {
            reserve_a: 0,
            reserve_b: 0,
            offset,
            lp_supply: 0,
            max_in_safety_margin_bps,
            swap_fees,
            // Protocol fees are a share of the swap fee, never charged on their own
            protocol_fees: Fees::new(FeeConfig::zero()),
            redemption_fees: Fees::new(redemption_fee),
            trading_data: TradingData::new(),
        })
    }

    /// Create an empty pool with the fees of a protocol config
    pub fn from_config(config: &ProtocolConfig, offset: u64) -> CoreResult<Self> {
        Self::new(
            config.swap_fee_config()?,
            config.redemption_fee_config()?,
            offset,
            config.swap.max_in_safety_margin_bps,
        )
    }

    pub fn reserves(&self) -> (u64, u64) {
        (self.reserve_a, self.reserve_b)
    }

    pub fn reserve_a(&self) -> u64 {
        self.reserve_a
    }

    pub fn reserve_b(&self) -> u64 {
        self.reserve_b
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn lp_supply(&self) -> u64 {
        self.lp_supply
    }

    pub fn max_in_safety_margin_bps(&self) -> u16 {
        self.max_in_safety_margin_bps
    }

    pub fn swap_fees(&self) -> &SwapFeeConfig {
        &self.swap_fees
    }

    pub fn protocol_fees(&self) -> &Fees<A, B> {
        &self.protocol_fees
    }

    pub fn redemption_fees(&self) -> &Fees<A, B> {
        &self.redemption_fees
    }

    pub fn trading_data(&self) -> &TradingData {
        &self.trading_data
    }

    /// Current curve invariant
    pub fn k(&self) -> CoreResult<u128> {
        cpmm::k(self.reserve_a, self.reserve_b, self.offset)
    }

    // ========================================================================
    // Swaps
    // ========================================================================

    pub fn quote_swap(&self, amount_in: u64, a2b: bool) -> CoreResult<SwapQuote> {
        cpmm::quote_swap(
            self.reserve_a,
            self.reserve_b,
            amount_in,
            self.offset,
            a2b,
            &self.swap_fees,
        )
    }

    /// Swap `amount_in` for at least `min_amount_out`.
    ///
    /// The pool fee stays in the input reserve; the protocol fee is moved to
    /// the protocol balance.
    pub fn swap(&mut self, amount_in: u64, a2b: bool, min_amount_out: u64) -> CoreResult<SwapQuote> {
        let quote = self.quote_swap(amount_in, a2b)?;
        if quote.amount_out < min_amount_out {
            debug!(amount_out = quote.amount_out, min_amount_out, "swap below minimum output");
            return Err(SteammError::SlippageExceeded);
        }

        let retained_in = safe_sub_u64(quote.amount_in, quote.protocol_fees)?;
        let (reserve_a, reserve_b) = if a2b {
            (
                safe_add_u64(self.reserve_a, retained_in)?,
                safe_sub_u64(self.reserve_b, quote.amount_out)?,
            )
        } else {
            (
                safe_sub_u64(self.reserve_a, quote.amount_out)?,
                safe_add_u64(self.reserve_b, retained_in)?,
            )
        };
        cpmm::check_invariance(self.k()?, reserve_a, reserve_b, self.offset)?;

        let mut protocol_fees = self.protocol_fees.clone();
        if a2b {
            protocol_fees.accrue_a(quote.protocol_fees)?;
        } else {
            protocol_fees.accrue_b(quote.protocol_fees)?;
        }

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.protocol_fees = protocol_fees;
        self.trading_data.record_swap(&quote);

        debug!(
            reserve_a,
            reserve_b,
            amount_in = quote.amount_in,
            amount_out = quote.amount_out,
            a2b,
            "settled swap"
        );
        Ok(quote)
    }

    /// Largest A->B input worth quoting on this pool, if bounded, kept
    /// `max_in_safety_margin_bps` below the drain point
    pub fn max_amount_in_on_a2b(&self) -> CoreResult<Option<u64>> {
        cpmm::max_amount_in_on_a2b(
            self.reserve_a,
            self.reserve_b,
            self.offset,
            self.max_in_safety_margin_bps,
        )
    }

    // ========================================================================
    // Liquidity
    // ========================================================================

    pub fn quote_deposit(&self, max_a: u64, max_b: u64) -> CoreResult<DepositQuote> {
        liquidity::quote_deposit(self.reserve_a, self.reserve_b, self.lp_supply, max_a, max_b)
    }

    /// Deposit at most `max_a` and `max_b`, minting at least `min_lp`.
    ///
    /// The first deposit also locks [`MINIMUM_LIQUIDITY`] shares in the supply.
    pub fn deposit(&mut self, max_a: u64, max_b: u64, min_lp: u64) -> CoreResult<DepositQuote> {
        let quote = self.quote_deposit(max_a, max_b)?;
        if quote.mint_lp < min_lp {
            return Err(SteammError::SlippageExceeded);
        }

        let reserve_a = safe_add_u64(self.reserve_a, quote.deposit_a)?;
        let reserve_b = safe_add_u64(self.reserve_b, quote.deposit_b)?;
        let mut lp_supply = safe_add_u64(self.lp_supply, quote.mint_lp)?;
        if quote.initial_deposit {
            lp_supply = safe_add_u64(lp_supply, MINIMUM_LIQUIDITY)?;
        }
        liquidity::assert_lp_supply_reserve_ratio(self.reserve_a, self.lp_supply, reserve_a, lp_supply)?;

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.lp_supply = lp_supply;

        debug!(reserve_a, reserve_b, lp_supply, mint_lp = quote.mint_lp, "settled deposit");
        Ok(quote)
    }

    pub fn quote_redeem(&self, lp_tokens: u64, min_a: u64, min_b: u64) -> CoreResult<RedeemQuote> {
        liquidity::quote_redeem(
            self.reserve_a,
            self.reserve_b,
            self.lp_supply,
            lp_tokens,
            min_a,
            min_b,
            self.redemption_fees.config(),
        )
    }

    /// Burn `lp_tokens`, paying out at least `min_a` and `min_b` net of fees
    pub fn redeem(&mut self, lp_tokens: u64, min_a: u64, min_b: u64) -> CoreResult<RedeemQuote> {
        let quote = self.quote_redeem(lp_tokens, min_a, min_b)?;

        let reserve_a = safe_sub_u64(self.reserve_a, quote.gross_a())?;
        let reserve_b = safe_sub_u64(self.reserve_b, quote.gross_b())?;
        let lp_supply = safe_sub_u64(self.lp_supply, quote.burn_lp)?;
        liquidity::assert_lp_supply_reserve_ratio(self.reserve_a, self.lp_supply, reserve_a, lp_supply)?;

        let mut redemption_fees = self.redemption_fees.clone();
        redemption_fees.accrue(quote.fees_a, quote.fees_b)?;

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.lp_supply = lp_supply;
        self.redemption_fees = redemption_fees;
        self.trading_data.record_redeem(&quote);

        debug!(reserve_a, reserve_b, lp_supply, burn_lp = quote.burn_lp, "settled redeem");
        Ok(quote)
    }

    // ========================================================================
    // Fee administration
    // ========================================================================

    /// Withdraw the accrued protocol swap fees
    pub fn collect_protocol_fees(&mut self) -> (u64, u64) {
        self.protocol_fees.withdraw()
    }

    /// Withdraw the accrued redemption fees
    pub fn collect_redemption_fees(&mut self) -> (u64, u64) {
        self.redemption_fees.withdraw()
    }

    pub fn set_swap_fee_config(&mut self, swap_fees: SwapFeeConfig) -> CoreResult<()> {
        swap_fees.validate()?;
        self.swap_fees = swap_fees;
        Ok(())
    }

    pub fn set_max_in_safety_margin_bps(&mut self, max_in_safety_margin_bps: u16) -> CoreResult<()> {
        validate_safety_margin(max_in_safety_margin_bps)?;
        self.max_in_safety_margin_bps = max_in_safety_margin_bps;
        Ok(())
    }

    pub fn set_redemption_fee_config(
        &mut self,
        fee_numerator: u64,
        fee_denominator: u64,
        min_fee: u64,
    ) -> CoreResult<()> {
        self.redemption_fees.set_config(fee_numerator, fee_denominator, min_fee)
    }
}

fn validate_safety_margin(max_in_safety_margin_bps: u16) -> CoreResult<()> {
    if max_in_safety_margin_bps > MAX_BPS {
        return Err(SteammError::config(format!(
            "safety margin {} bps exceeds {}",
            max_in_safety_margin_bps, MAX_BPS
        )));
    }
    Ok(())
}

impl<A, B> Clone for Pool<A, B> {
    fn clone(&self) -> Self {
        Self {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            offset: self.offset,
            lp_supply: self.lp_supply,
            max_in_safety_margin_bps: self.max_in_safety_margin_bps,
            swap_fees: self.swap_fees,
            protocol_fees: self.protocol_fees.clone(),
            redemption_fees: self.redemption_fees.clone(),
            trading_data: self.trading_data,
        }
    }
}

impl<A, B> fmt::Debug for Pool<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("reserve_a", &self.reserve_a)
            .field("reserve_b", &self.reserve_b)
            .field("offset", &self.offset)
            .field("lp_supply", &self.lp_supply)
            .field("max_in_safety_margin_bps", &self.max_in_safety_margin_bps)
            .field("swap_fees", &self.swap_fees)
            .field("protocol_fees", &self.protocol_fees)
            .field("redemption_fees", &self.redemption_fees)
            .field("trading_data", &self.trading_data)
            .finish()
    }
}

impl<A, B> PartialEq for Pool<A, B> {
    fn eq(&self, other: &Self) -> bool {
        self.reserve_a == other.reserve_a
            && self.reserve_b == other.reserve_b
            && self.offset == other.offset
            && self.lp_supply == other.lp_supply
            && self.max_in_safety_margin_bps == other.max_in_safety_margin_bps
            && self.swap_fees == other.swap_fees
            && self.protocol_fees == other.protocol_fees
            && self.redemption_fees == other.redemption_fees
            && self.trading_data == other.trading_data
    }
}
