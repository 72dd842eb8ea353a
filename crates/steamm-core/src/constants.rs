//! # Protocol Constants
//!
//! Fixed parameters shared by the quoting engines and the bank:
//! - Basis point scale
//! - Liquidity floor locked by the first deposit
//! - Default fee and utilisation parameters used by [`crate::config`]

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Maximum percentage in basis points (100%)
pub const MAX_BPS: u16 = 10_000;

// ============================================================================
// Liquidity Constants
// ============================================================================

/// LP shares locked forever by the initial deposit.
///
/// Keeps `lp_supply` strictly positive once a pool is seeded so the supply
/// can never be drained back to zero and re-priced by a dust deposit.
pub const MINIMUM_LIQUIDITY: u64 = 10;

// ============================================================================
// Default Fee Parameters
// ============================================================================

/// Default swap fee (0.30%)
pub const DEFAULT_SWAP_FEE_BPS: u64 = 30;

/// Default share of swap fees routed to the protocol (20%)
pub const DEFAULT_PROTOCOL_SHARE_BPS: u16 = 2_000;

/// Default redemption fee (0.10%)
pub const DEFAULT_REDEMPTION_FEE_BPS: u64 = 10;

/// Default margin kept below the drain point when clamping A->B inputs (1%)
pub const DEFAULT_MAX_IN_SAFETY_MARGIN_BPS: u16 = 100;

// ============================================================================
// Default Bank Parameters
// ============================================================================

/// Default target share of bank funds deployed into the lending market
pub const DEFAULT_TARGET_UTILISATION_BPS: u16 = 8_000;

/// Default half-width of the no-action band around the target
pub const DEFAULT_UTILISATION_BUFFER_BPS: u16 = 1_000;
