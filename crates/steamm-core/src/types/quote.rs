//! # Quote Types
//!
//! Value records produced by the quoting engines and consumed immediately by
//! settlement. None of them are persisted.

use crate::errors::{CoreResult, SteammError};
use crate::math::{safe_add_u64, safe_sub_u64};

/// Result of quoting a swap
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    /// Gross input supplied by the trader, fees included
    pub amount_in: u64,
    /// Output paid to the trader
    pub amount_out: u64,
    /// Part of the input fee routed to the protocol
    pub protocol_fees: u64,
    /// Part of the input fee left with the pool's LPs
    pub pool_fees: u64,
    /// Direction: `true` when swapping A for B
    pub a2b: bool,
}

impl SwapQuote {
    /// Total fee charged on the input
    pub fn total_fees(&self) -> u64 {
        self.protocol_fees.saturating_add(self.pool_fees)
    }

    /// Input that actually moves the curve
    pub fn amount_in_net(&self) -> CoreResult<u64> {
        safe_sub_u64(self.amount_in, self.total_fees())
    }

    /// Layer additional fees on top of the curve fee, e.g. from a pool hook
    pub fn add_extra_fees(&mut self, protocol_fees: u64, pool_fees: u64) -> CoreResult<()> {
        let protocol = safe_add_u64(self.protocol_fees, protocol_fees)?;
        let pool = safe_add_u64(self.pool_fees, pool_fees)?;
        let total = safe_add_u64(protocol, pool)?;
        if total > self.amount_in {
            return Err(SteammError::InsufficientInput);
        }
        self.protocol_fees = protocol;
        self.pool_fees = pool;
        Ok(())
    }
}

/// Result of quoting a deposit
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositQuote {
    /// Whether this deposit seeds an empty pool
    pub initial_deposit: bool,
    pub deposit_a: u64,
    pub deposit_b: u64,
    /// LP shares minted to the depositor
    pub mint_lp: u64,
}

/// Result of quoting a redemption
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemQuote {
    /// Net amount of A paid out
    pub withdraw_a: u64,
    /// Net amount of B paid out
    pub withdraw_b: u64,
    /// Redemption fee retained on A
    pub fees_a: u64,
    /// Redemption fee retained on B
    pub fees_b: u64,
    /// LP shares burned
    pub burn_lp: u64,
}

impl RedeemQuote {
    /// Amount of A leaving the reserve (payout plus fee)
    pub fn gross_a(&self) -> u64 {
        self.withdraw_a.saturating_add(self.fees_a)
    }

    /// Amount of B leaving the reserve (payout plus fee)
    pub fn gross_b(&self) -> u64 {
        self.withdraw_b.saturating_add(self.fees_b)
    }
}
