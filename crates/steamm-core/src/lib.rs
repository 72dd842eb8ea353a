//! # STEAMM Core - Pool Pricing and Bank Utilisation
//!
//! This crate contains the pure computational core of the STEAMM AMM. It provides:
//!
//! - Fee computation with a minimum-fee floor and protocol/pool fee splits
//! - Constant-product swap quoting with a virtual reserve offset
//! - Deposit and redemption quotes for LP shares
//! - Lifetime trading statistics
//! - Bank utilisation control for idle liquidity lent to an external market
//!
//! Persistence, transaction construction and the lending market itself are
//! external collaborators. The [`pool::Pool`] and [`bank::Bank`] records are
//! plain in-memory state that a settlement layer loads, mutates through this
//! crate and writes back.
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde derives on quotes and state records

pub mod bank;
pub mod config;
pub mod constants;
pub mod cpmm;
pub mod errors;
pub mod fees;
pub mod liquidity;
pub mod math;
pub mod pool;
pub mod registry;
pub mod types;

// Re-export commonly used items
pub use bank::{Bank, Lending, LendingAction, LendingMarket};
pub use config::ProtocolConfig;
pub use constants::*;
pub use errors::{CoreResult, SteammError};
pub use fees::{FeeConfig, Fees, SwapFeeConfig};
pub use pool::Pool;
pub use registry::{Asset, PoolId, PoolRegistry};
pub use types::*;
