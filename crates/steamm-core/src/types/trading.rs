//! # Trading Ledger
//!
//! Lifetime swap volumes and fee totals. Observability state only: every
//! counter saturates instead of failing.

use super::quote::{RedeemQuote, SwapQuote};

/// Monotonic per-pool statistics, created zeroed and never reset
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TradingData {
    pub swap_a_in_amount: u128,
    pub swap_a_out_amount: u128,
    pub swap_b_in_amount: u128,
    pub swap_b_out_amount: u128,
    pub protocol_fees_a: u64,
    pub protocol_fees_b: u64,
    pub redemption_fees_a: u64,
    pub redemption_fees_b: u64,
    pub pool_fees_a: u64,
    pub pool_fees_b: u64,
}

impl TradingData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a settled swap. Fees are charged on the input side.
    pub fn record_swap(&mut self, quote: &SwapQuote) {
        let amount_in = quote.amount_in as u128;
        let amount_out = quote.amount_out as u128;

        if quote.a2b {
            self.swap_a_in_amount = self.swap_a_in_amount.saturating_add(amount_in);
            self.swap_b_out_amount = self.swap_b_out_amount.saturating_add(amount_out);
            self.protocol_fees_a = self.protocol_fees_a.saturating_add(quote.protocol_fees);
            self.pool_fees_a = self.pool_fees_a.saturating_add(quote.pool_fees);
        } else {
            self.swap_b_in_amount = self.swap_b_in_amount.saturating_add(amount_in);
            self.swap_a_out_amount = self.swap_a_out_amount.saturating_add(amount_out);
            self.protocol_fees_b = self.protocol_fees_b.saturating_add(quote.protocol_fees);
            self.pool_fees_b = self.pool_fees_b.saturating_add(quote.pool_fees);
        }
    }

    /// Account for the fees retained by a settled redemption
    pub fn record_redeem(&mut self, quote: &RedeemQuote) {
        self.redemption_fees_a = self.redemption_fees_a.saturating_add(quote.fees_a);
        self.redemption_fees_b = self.redemption_fees_b.saturating_add(quote.fees_b);
    }

    pub fn total_swap_a_in_amount(&self) -> u128 {
        self.swap_a_in_amount
    }

    pub fn total_swap_a_out_amount(&self) -> u128 {
        self.swap_a_out_amount
    }

    pub fn total_swap_b_in_amount(&self) -> u128 {
        self.swap_b_in_amount
    }

    pub fn total_swap_b_out_amount(&self) -> u128 {
        self.swap_b_out_amount
    }
}
