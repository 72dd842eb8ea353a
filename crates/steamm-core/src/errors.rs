//! # Core Error Types
//!
//! Every fallible computation in the crate returns [`CoreResult`]. Errors are
//! detected synchronously and never retried internally; a failed call leaves
//! all state untouched.

use thiserror::Error;

/// Errors raised by the quoting engines, the bank and the pool records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum SteammError {
    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Arithmetic underflow")]
    ArithmeticUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    // ========================================================================
    // Swap Errors
    // ========================================================================

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Insufficient input: fee consumes the entire amount")]
    InsufficientInput,

    #[error("Slippage exceeded")]
    SlippageExceeded,

    #[error("Invariant violation: k decreased from {before} to {after}")]
    InvariantViolation { before: u128, after: u128 },

    // ========================================================================
    // Liquidity Errors
    // ========================================================================

    #[error("Insufficient initial liquidity")]
    InsufficientInitialLiquidity,

    #[error("Insufficient deposit: no LP tokens would be minted")]
    InsufficientDeposit,

    #[error("Insufficient burn")]
    InsufficientBurn,

    #[error("LP supply to reserve ratio decreased")]
    LpRatioViolation,

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    #[error("Invalid fee config")]
    InvalidFeeConfig,

    #[error("Invalid utilisation config: target {target_bps} bps, buffer {buffer_bps} bps")]
    InvalidUtilisationConfig { target_bps: u16, buffer_bps: u16 },

    #[error("Lending is not initialised for this bank")]
    LendingNotInitialised,

    #[error("Pool already registered: {0}")]
    PoolAlreadyRegistered(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, SteammError>;

// Helper functions for creating specific errors
impl SteammError {
    /// Create an invalid utilisation error for the rejected band
    pub fn invalid_utilisation(target_bps: u16, buffer_bps: u16) -> Self {
        Self::InvalidUtilisationConfig { target_bps, buffer_bps }
    }

    /// Create a configuration error with reason
    pub fn config(reason: impl Into<String>) -> Self {
        Self::ConfigError(reason.into())
    }
}
