//! # Fee Engine
//!
//! Fee computation with a minimum-fee floor, the protocol/pool split of swap
//! fees, and the withdrawable fee balances a pool accumulates per asset.
//!
//! Rounding is conservative on both ends: fees are rounded up so the protocol
//! never under-collects, while the protocol's share of a split is rounded
//! down so the truncation remainder stays with the pool's LPs.

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::constants::{BPS_DENOMINATOR, MAX_BPS};
use crate::errors::{CoreResult, SteammError};
use crate::math::{mul_div_u64, safe_add_u64, safe_calculate_bps, safe_sub_u64, Rounding};

/// Fee rate as a fraction with a minimum charge
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeConfig {
    fee_numerator: u64,
    fee_denominator: u64,
    min_fee: u64,
}

impl FeeConfig {
    /// Create a validated fee config. The rate may not exceed 100%.
    pub fn new(fee_numerator: u64, fee_denominator: u64, min_fee: u64) -> CoreResult<Self> {
        let config = Self {
            fee_numerator,
            fee_denominator,
            min_fee,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fee expressed in basis points
    pub fn from_bps(fee_bps: u64, min_fee: u64) -> CoreResult<Self> {
        Self::new(fee_bps, BPS_DENOMINATOR, min_fee)
    }

    /// A config that never charges anything
    pub fn zero() -> Self {
        Self {
            fee_numerator: 0,
            fee_denominator: BPS_DENOMINATOR,
            min_fee: 0,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.fee_denominator == 0 || self.fee_numerator > self.fee_denominator {
            return Err(SteammError::InvalidFeeConfig);
        }
        Ok(())
    }

    pub fn fee_numerator(&self) -> u64 {
        self.fee_numerator
    }

    pub fn fee_denominator(&self) -> u64 {
        self.fee_denominator
    }

    pub fn min_fee(&self) -> u64 {
        self.min_fee
    }

    /// `(numerator, denominator)` of the fee rate
    pub fn fee_ratio(&self) -> (u64, u64) {
        (self.fee_numerator, self.fee_denominator)
    }

    /// Fee owed on `amount`
    pub fn compute_fee(&self, amount: u64) -> CoreResult<u64> {
        compute_fee(self, amount)
    }
}

/// Compute the fee on `amount`: `max(min_fee, ceil(amount * num / den))`,
/// or zero for a zero amount.
pub fn compute_fee(config: &FeeConfig, amount: u64) -> CoreResult<u64> {
    config.validate()?;
    if amount == 0 {
        return Ok(0);
    }

    let fee = mul_div_u64(
        amount,
        config.fee_numerator,
        config.fee_denominator,
        Rounding::Up,
    )?;

    Ok(fee.max(config.min_fee))
}

/// Split a fee into `(protocol_fee, pool_fee)`.
///
/// The protocol share is floored; the remainder goes to the pool.
pub fn split_fee(total: u64, protocol_share_bps: u16) -> CoreResult<(u64, u64)> {
    if protocol_share_bps > MAX_BPS {
        return Err(SteammError::InvalidFeeConfig);
    }
    let protocol_fee = safe_calculate_bps(total, protocol_share_bps as u64)?;
    let pool_fee = safe_sub_u64(total, protocol_fee)?;
    Ok((protocol_fee, pool_fee))
}

/// Swap fee rate together with the protocol's cut of it
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapFeeConfig {
    pub pool_fee: FeeConfig,
    /// Share of every swap fee routed to the protocol
    pub protocol_share_bps: u16,
}

impl SwapFeeConfig {
    pub fn new(pool_fee: FeeConfig, protocol_share_bps: u16) -> CoreResult<Self> {
        let config = Self {
            pool_fee,
            protocol_share_bps,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.pool_fee.validate()?;
        if self.protocol_share_bps > MAX_BPS {
            return Err(SteammError::InvalidFeeConfig);
        }
        Ok(())
    }

    /// Fees on a swap input as `(protocol_fees, pool_fees)`
    pub fn compute_swap_fees(&self, amount: u64) -> CoreResult<(u64, u64)> {
        let total = compute_fee(&self.pool_fee, amount)?;
        let (protocol_fees, pool_fees) = split_fee(total, self.protocol_share_bps)?;
        debug!(amount, total, protocol_fees, pool_fees, "computed swap fees");
        Ok((protocol_fees, pool_fees))
    }
}

/// Withdrawable fee balances on both sides of a pool.
///
/// `A` and `B` are zero-sized asset markers; they only keep balances of
/// different pools from being mixed up at compile time.
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(bound = ""))]
pub struct Fees<A, B> {
    balance_a: u64,
    balance_b: u64,
    config: FeeConfig,
    #[cfg_attr(feature = "client", serde(skip))]
    _assets: PhantomData<fn() -> (A, B)>,
}

impl<A, B> Fees<A, B> {
    pub fn new(config: FeeConfig) -> Self {
        Self {
            balance_a: 0,
            balance_b: 0,
            config,
            _assets: PhantomData,
        }
    }

    pub fn config(&self) -> &FeeConfig {
        &self.config
    }

    /// Replace the governing fee config. Accrued balances are kept.
    pub fn set_config(&mut self, fee_numerator: u64, fee_denominator: u64, min_fee: u64) -> CoreResult<()> {
        self.config = FeeConfig::new(fee_numerator, fee_denominator, min_fee)?;
        Ok(())
    }

    /// `(balance_a, balance_b)`
    pub fn balances(&self) -> (u64, u64) {
        (self.balance_a, self.balance_b)
    }

    pub fn fee_a(&self) -> u64 {
        self.balance_a
    }

    pub fn fee_b(&self) -> u64 {
        self.balance_b
    }

    pub fn accrue_a(&mut self, amount: u64) -> CoreResult<()> {
        self.balance_a = safe_add_u64(self.balance_a, amount)?;
        Ok(())
    }

    pub fn accrue_b(&mut self, amount: u64) -> CoreResult<()> {
        self.balance_b = safe_add_u64(self.balance_b, amount)?;
        Ok(())
    }

    /// Accrue on both sides; nothing changes if either side would overflow
    pub fn accrue(&mut self, amount_a: u64, amount_b: u64) -> CoreResult<()> {
        let balance_a = safe_add_u64(self.balance_a, amount_a)?;
        let balance_b = safe_add_u64(self.balance_b, amount_b)?;
        self.balance_a = balance_a;
        self.balance_b = balance_b;
        Ok(())
    }

    /// Take both balances, leaving zero behind
    pub fn withdraw(&mut self) -> (u64, u64) {
        let balances = self.balances();
        self.balance_a = 0;
        self.balance_b = 0;
        balances
    }
}

impl<A, B> Clone for Fees<A, B> {
    fn clone(&self) -> Self {
        Self {
            balance_a: self.balance_a,
            balance_b: self.balance_b,
            config: self.config,
            _assets: PhantomData,
        }
    }
}

impl<A, B> fmt::Debug for Fees<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fees")
            .field("balance_a", &self.balance_a)
            .field("balance_b", &self.balance_b)
            .field("config", &self.config)
            .finish()
    }
}

impl<A, B> PartialEq for Fees<A, B> {
    fn eq(&self, other: &Self) -> bool {
        self.balance_a == other.balance_a
            && self.balance_b == other.balance_b
            && self.config == other.config
    }
}

impl<A, B> Eq for Fees<A, B> {}
