//! # Bank Utilisation Controller
//!
//! A bank holds one asset on behalf of its pools and may lend part of it to an
//! external lending market. This module decides when capital has to move
//! between the bank and the market, and converts between underlying amounts,
//! the market's ctokens and the bank's own btokens.
//!
//! The lending market itself is out of scope: callers implement
//! [`LendingMarket`] and act on the [`LendingAction`] returned here.

use tracing::{debug, warn};

use crate::config::ProtocolConfig;
use crate::constants::{BPS_DENOMINATOR, MAX_BPS};
use crate::errors::{CoreResult, SteammError};
use crate::math::{mul_div_u64, safe_add_u64, safe_calculate_bps, safe_sub_u64, Rounding};

/// Decision on whether capital must move before or after a bank operation
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LendingAction {
    /// Utilisation inside the band; leave capital where it is
    None,
    /// Move funds into the market; as a band decision, utilisation above the band
    Lend,
    /// Move funds out of the market; as a band decision, utilisation below the
    /// band or not enough liquid funds for a withdrawal
    Recall,
}

/// Adapter to the external lending market, implemented by the caller
pub trait LendingMarket {
    /// Deposit `amount` underlying, returning the ctokens minted
    fn deploy(&mut self, amount: u64) -> CoreResult<u64>;

    /// Redeem `ctokens`, returning the underlying released
    fn recall(&mut self, ctokens: u64) -> CoreResult<u64>;
}

/// Lending position of a bank
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lending {
    /// Underlying currently deployed into the market
    pub funds_deployed: u64,
    /// Market receipt tokens held for `funds_deployed`
    pub ctokens: u64,
    pub target_utilisation_bps: u16,
    pub utilisation_buffer_bps: u16,
    /// Index of the asset's reserve inside the lending market
    pub reserve_array_index: u64,
}

impl Lending {
    pub fn new(
        target_utilisation_bps: u16,
        utilisation_buffer_bps: u16,
        reserve_array_index: u64,
    ) -> CoreResult<Self> {
        validate_utilisation_band(target_utilisation_bps, utilisation_buffer_bps)?;
        Ok(Self {
            funds_deployed: 0,
            ctokens: 0,
            target_utilisation_bps,
            utilisation_buffer_bps,
            reserve_array_index,
        })
    }
}

/// Both values at most 100%, and the band's lower edge not below zero
pub fn validate_utilisation_band(target_bps: u16, buffer_bps: u16) -> CoreResult<()> {
    if target_bps > MAX_BPS || buffer_bps > MAX_BPS || buffer_bps > target_bps {
        return Err(SteammError::invalid_utilisation(target_bps, buffer_bps));
    }
    Ok(())
}

/// Share of funds deployed, in basis points. Zero for an empty bank.
pub fn effective_utilisation_bps(funds_available: u64, funds_deployed: u64) -> u64 {
    let total = funds_available as u128 + funds_deployed as u128;
    if total == 0 {
        return 0;
    }
    // deployed <= total, so the quotient never exceeds 10_000
    (funds_deployed as u128 * BPS_DENOMINATOR as u128 / total) as u64
}

/// Decide the lending action around an operation moving `amount` in
/// (`is_input`) or out of the bank.
///
/// A withdrawal larger than the liquid funds always needs a recall. Otherwise
/// the utilisation after the operation is compared with the band
/// `[target - buffer, target + buffer]`; inside the band nothing happens.
pub fn needs_lending_action(
    funds_available: u64,
    funds_deployed: u64,
    target_utilisation_bps: u16,
    utilisation_buffer_bps: u16,
    amount: u64,
    is_input: bool,
) -> CoreResult<LendingAction> {
    if !is_input && amount > funds_available {
        warn!(
            amount,
            funds_available,
            "withdrawal exceeds liquid funds, recall required"
        );
        return Ok(LendingAction::Recall);
    }

    let funds_available_after = if is_input {
        safe_add_u64(funds_available, amount)?
    } else {
        safe_sub_u64(funds_available, amount)?
    };

    let effective = effective_utilisation_bps(funds_available_after, funds_deployed);
    let target = target_utilisation_bps as u64;
    let buffer = utilisation_buffer_bps as u64;

    let action = if effective < target.saturating_sub(buffer) {
        LendingAction::Recall
    } else if effective > target + buffer {
        LendingAction::Lend
    } else {
        LendingAction::None
    };

    debug!(
        funds_available_after,
        funds_deployed,
        effective,
        target,
        buffer,
        ?action,
        "lending decision"
    );
    Ok(action)
}

/// Liquid funds plus an optional lending position, with btoken accounting
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bank {
    pub funds_available: u64,
    /// `None` means the bank never lends
    pub lending: Option<Lending>,
    /// Outstanding btokens issued against the bank's funds
    pub btoken_supply: u64,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start lending with the given utilisation band
    pub fn init_lending(
        &mut self,
        target_utilisation_bps: u16,
        utilisation_buffer_bps: u16,
        reserve_array_index: u64,
    ) -> CoreResult<()> {
        if self.lending.is_some() {
            return Err(SteammError::config("lending already initialised"));
        }
        self.lending = Some(Lending::new(
            target_utilisation_bps,
            utilisation_buffer_bps,
            reserve_array_index,
        )?);
        Ok(())
    }

    /// Start lending with the `[bank]` band of a protocol config
    pub fn init_lending_from_config(
        &mut self,
        config: &ProtocolConfig,
        reserve_array_index: u64,
    ) -> CoreResult<()> {
        self.init_lending(
            config.bank.target_utilisation_bps,
            config.bank.utilisation_buffer_bps,
            reserve_array_index,
        )
    }

    /// Replace the utilisation band of an existing lending position
    pub fn set_utilisation_bps(&mut self, target_bps: u16, buffer_bps: u16) -> CoreResult<()> {
        validate_utilisation_band(target_bps, buffer_bps)?;
        let lending = self.lending.as_mut().ok_or(SteammError::LendingNotInitialised)?;
        lending.target_utilisation_bps = target_bps;
        lending.utilisation_buffer_bps = buffer_bps;
        Ok(())
    }

    pub fn funds_deployed(&self) -> u64 {
        self.lending.map_or(0, |l| l.funds_deployed)
    }

    pub fn total_funds(&self) -> CoreResult<u64> {
        safe_add_u64(self.funds_available, self.funds_deployed())
    }

    pub fn effective_utilisation_bps(&self) -> u64 {
        effective_utilisation_bps(self.funds_available, self.funds_deployed())
    }

    /// Lending action around an operation; always `None` for a non-lending bank
    pub fn needs_lending_action(&self, amount: u64, is_input: bool) -> CoreResult<LendingAction> {
        match &self.lending {
            None => Ok(LendingAction::None),
            Some(lending) => needs_lending_action(
                self.funds_available,
                lending.funds_deployed,
                lending.target_utilisation_bps,
                lending.utilisation_buffer_bps,
                amount,
                is_input,
            ),
        }
    }

    /// `(funds_deployed, ctokens)`: underlying per ctoken as a fraction
    pub fn ctoken_ratio(&self) -> Option<(u64, u64)> {
        self.lending.map(|l| (l.funds_deployed, l.ctokens))
    }

    /// Ctokens to redeem in order to recall `amount` underlying.
    ///
    /// Rounded up so the recall covers the amount, capped at the ctokens held.
    pub fn ctoken_amount(&self, amount: u64) -> CoreResult<u64> {
        let lending = self.lending.as_ref().ok_or(SteammError::LendingNotInitialised)?;
        if lending.funds_deployed == 0 {
            return Ok(0);
        }
        let ctokens = mul_div_u64(amount, lending.ctokens, lending.funds_deployed, Rounding::Up)?;
        Ok(ctokens.min(lending.ctokens))
    }

    /// `(total_funds, btoken_supply)`: underlying per btoken as a fraction
    pub fn btoken_ratio(&self) -> CoreResult<(u64, u64)> {
        Ok((self.total_funds()?, self.btoken_supply))
    }

    /// Btokens worth `amount` underlying, floored. 1:1 for an empty bank.
    pub fn to_btokens(&self, amount: u64) -> CoreResult<u64> {
        let total_funds = self.total_funds()?;
        if total_funds == 0 || self.btoken_supply == 0 {
            return Ok(amount);
        }
        mul_div_u64(amount, self.btoken_supply, total_funds, Rounding::Down)
    }

    /// Underlying redeemable for `btokens`, floored
    pub fn from_btokens(&self, btokens: u64) -> CoreResult<u64> {
        let total_funds = self.total_funds()?;
        if self.btoken_supply == 0 {
            return Ok(0);
        }
        mul_div_u64(btokens, total_funds, self.btoken_supply, Rounding::Down)
    }

    /// Take `amount` underlying into the bank, returning the btokens minted
    pub fn deposit(&mut self, amount: u64) -> CoreResult<u64> {
        let btokens = self.to_btokens(amount)?;
        let funds_available = safe_add_u64(self.funds_available, amount)?;
        let btoken_supply = safe_add_u64(self.btoken_supply, btokens)?;

        self.funds_available = funds_available;
        self.btoken_supply = btoken_supply;
        debug!(amount, btokens, "bank deposit");
        Ok(btokens)
    }

    /// Burn `btokens` and pay out their underlying from liquid funds.
    ///
    /// Fails with [`SteammError::InsufficientLiquidity`] if the liquid funds do
    /// not cover the payout; the caller recalls first.
    pub fn withdraw(&mut self, btokens: u64) -> CoreResult<u64> {
        if btokens > self.btoken_supply {
            return Err(SteammError::InsufficientBurn);
        }
        let amount = self.from_btokens(btokens)?;
        if amount > self.funds_available {
            return Err(SteammError::InsufficientLiquidity);
        }

        self.funds_available -= amount;
        self.btoken_supply -= btokens;
        debug!(amount, btokens, "bank withdraw");
        Ok(amount)
    }

    /// Underlying to recall before withdrawing `amount`.
    ///
    /// Zero while liquid funds cover the withdrawal. Otherwise at least the
    /// shortfall, and enough that the bank sits at its target utilisation once
    /// the withdrawal is paid; never more than is deployed.
    pub fn recall_amount_for_withdraw(&self, amount: u64) -> CoreResult<u64> {
        let lending = match &self.lending {
            Some(lending) => lending,
            None => return Ok(0),
        };
        if amount <= self.funds_available {
            return Ok(0);
        }

        let shortfall = amount - self.funds_available;
        let total_after = safe_sub_u64(self.total_funds()?, amount)?;
        let target_deployed = safe_calculate_bps(total_after, lending.target_utilisation_bps as u64)?;
        let excess_deployed = if lending.funds_deployed > target_deployed {
            lending.funds_deployed - target_deployed
        } else {
            0
        };

        Ok(shortfall.max(excess_deployed).min(lending.funds_deployed))
    }

    /// Ctokens and funds the bank can still book without overflowing.
    ///
    /// Called after the market has acted, so the failure can only be reported;
    /// the caller must abort the enclosing transaction on `Err`.
    fn check_booking(&self, ctokens_in: u64, funds_in: u64) -> CoreResult<()> {
        let lending = self.lending.as_ref().ok_or(SteammError::LendingNotInitialised)?;
        safe_add_u64(lending.ctokens, ctokens_in)?;
        safe_add_u64(self.funds_available, funds_in)?;
        Ok(())
    }

    /// Move `amount` liquid funds into the lending market.
    ///
    /// The market is called before the bank books the minted ctokens. If the
    /// booking fails the bank is left untouched but the market is not, so the
    /// caller must abort the enclosing transaction on `Err`.
    pub fn deploy<M: LendingMarket>(&mut self, market: &mut M, amount: u64) -> CoreResult<()> {
        let lending = self.lending.as_ref().ok_or(SteammError::LendingNotInitialised)?;
        if amount > self.funds_available {
            return Err(SteammError::InsufficientLiquidity);
        }
        let funds_deployed = safe_add_u64(lending.funds_deployed, amount)?;

        let minted = market.deploy(amount)?;
        self.check_booking(minted, 0)?;

        // Checked above
        let lending = self.lending.as_mut().ok_or(SteammError::LendingNotInitialised)?;
        lending.ctokens += minted;
        lending.funds_deployed = funds_deployed;
        self.funds_available -= amount;

        debug!(amount, ctokens = minted, "deployed funds");
        Ok(())
    }

    /// Recall `amount` underlying from the lending market, returning what
    /// the market actually released.
    ///
    /// Same contract as [`Bank::deploy`]: an `Err` after the market call
    /// leaves the bank untouched and must abort the enclosing transaction.
    pub fn recall<M: LendingMarket>(&mut self, market: &mut M, amount: u64) -> CoreResult<u64> {
        let ctokens = self.ctoken_amount(amount)?;
        if ctokens == 0 {
            return Ok(0);
        }

        let released = market.recall(ctokens)?;
        self.check_booking(0, released)?;

        let lending = self.lending.as_mut().ok_or(SteammError::LendingNotInitialised)?;
        lending.ctokens -= ctokens;
        lending.funds_deployed -= released.min(lending.funds_deployed);
        self.funds_available += released;

        debug!(amount, ctokens, released, "recalled funds");
        Ok(released)
    }

    /// Capital movement that brings the bank back to its target utilisation.
    ///
    /// `(Lend, n)` deploys `n` more, `(Recall, n)` recalls `n`. While the
    /// effective utilisation sits inside `[target - buffer, target + buffer]`
    /// nothing moves. A bank without lending never rebalances.
    pub fn rebalance_amount(&self) -> CoreResult<(LendingAction, u64)> {
        let lending = match &self.lending {
            Some(lending) => lending,
            None => return Ok((LendingAction::None, 0)),
        };

        let effective = self.effective_utilisation_bps();
        let target = lending.target_utilisation_bps as u64;
        let buffer = lending.utilisation_buffer_bps as u64;
        if effective >= target.saturating_sub(buffer) && effective <= target + buffer {
            return Ok((LendingAction::None, 0));
        }

        let target_deployed = safe_calculate_bps(self.total_funds()?, target)?;
        let movement = if target_deployed > lending.funds_deployed {
            // Never more than the liquid funds: target_deployed <= total_funds
            (LendingAction::Lend, target_deployed - lending.funds_deployed)
        } else if lending.funds_deployed > target_deployed {
            (LendingAction::Recall, lending.funds_deployed - target_deployed)
        } else {
            (LendingAction::None, 0)
        };

        debug!(effective, target, buffer, ?movement, "rebalance amount");
        Ok(movement)
    }

    /// Deploy or recall through `market` until the bank is back at target.
    ///
    /// Returns the action taken and the underlying moved.
    pub fn rebalance<M: LendingMarket>(&mut self, market: &mut M) -> CoreResult<(LendingAction, u64)> {
        match self.rebalance_amount()? {
            (LendingAction::Lend, amount) if amount > 0 => {
                self.deploy(market, amount)?;
                Ok((LendingAction::Lend, amount))
            }
            (LendingAction::Recall, amount) if amount > 0 => {
                let released = self.recall(market, amount)?;
                Ok((LendingAction::Recall, released))
            }
            _ => Ok((LendingAction::None, 0)),
        }
    }
}
