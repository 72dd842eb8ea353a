//! # Pool Registry
//!
//! Keyed map from an ordered asset pair to the handle of the pool trading it.
//! Owned and passed around by the caller; there is no global instance.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::errors::{CoreResult, SteammError};

/// Zero-sized marker naming an asset at the type level
pub trait Asset {
    const SYMBOL: &'static str;
}

/// Opaque pool handle assigned by the caller's storage layer
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Registry key: the two asset symbols in pool order
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub asset_a: String,
    pub asset_b: String,
}

impl PairKey {
    pub fn of<A: Asset, B: Asset>() -> Self {
        Self {
            asset_a: A::SYMBOL.to_string(),
            asset_b: B::SYMBOL.to_string(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.asset_a, self.asset_b)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: HashMap<PairKey, PoolId>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the pool for `A/B`. One pool per ordered pair.
    pub fn register<A: Asset, B: Asset>(&mut self, pool_id: PoolId) -> CoreResult<()> {
        let key = PairKey::of::<A, B>();
        if self.pools.contains_key(&key) {
            return Err(SteammError::PoolAlreadyRegistered(key.to_string()));
        }
        debug!(pair = %key, %pool_id, "registered pool");
        self.pools.insert(key, pool_id);
        Ok(())
    }

    pub fn get<A: Asset, B: Asset>(&self) -> Option<PoolId> {
        self.pools.get(&PairKey::of::<A, B>()).copied()
    }

    pub fn contains<A: Asset, B: Asset>(&self) -> bool {
        self.pools.contains_key(&PairKey::of::<A, B>())
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &PoolId)> {
        self.pools.iter()
    }
}
