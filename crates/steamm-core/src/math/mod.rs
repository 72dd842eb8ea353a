//! # Mathematical Functions
//!
//! Overflow-checked integer arithmetic used by every engine.

pub mod safe_math;

// Re-export commonly used functions
pub use safe_math::*;
