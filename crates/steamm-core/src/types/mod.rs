//! # Core Types
//!
//! Transient quote records and the lifetime trading ledger.

pub mod quote;
pub mod trading;

pub use quote::*;
pub use trading::*;
