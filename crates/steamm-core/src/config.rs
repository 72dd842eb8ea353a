use std::fs;

use serde::{Deserialize, Serialize};

use crate::bank::validate_utilisation_band;
use crate::constants::*;
use crate::errors::{CoreResult, SteammError};
use crate::fees::{FeeConfig, SwapFeeConfig};

/// Protocol parameters loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// Swap fee and protocol cut
    pub swap: SwapSection,

    /// Fee kept back on LP redemptions
    pub redemption: RedemptionSection,

    /// Default utilisation band for lending banks
    pub bank: BankSection,
}

/// `[swap]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SwapSection {
    /// Fee on swap input (basis points)
    pub fee_bps: u64,

    /// Minimum fee charged on any non-zero input
    pub min_fee: u64,

    /// Share of the swap fee routed to the protocol (basis points)
    pub protocol_share_bps: u16,

    /// Margin kept below the drain point of offset pools (basis points)
    pub max_in_safety_margin_bps: u16,
}

/// `[redemption]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RedemptionSection {
    pub fee_bps: u64,
    pub min_fee: u64,
}

/// `[bank]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BankSection {
    pub target_utilisation_bps: u16,
    pub utilisation_buffer_bps: u16,
}

impl ProtocolConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> CoreResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SteammError::config(format!("Failed to read config file {}: {}", path, e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: ProtocolConfig = toml::from_str(content)
            .map_err(|e| SteammError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn to_toml_string(&self) -> CoreResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SteammError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> CoreResult<()> {
        let content = self.to_toml_string()?;
        fs::write(path, content)
            .map_err(|e| SteammError::config(format!("Failed to write config file {}: {}", path, e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.swap.fee_bps > BPS_DENOMINATOR {
            return Err(SteammError::config(format!(
                "swap.fee_bps {} exceeds {}",
                self.swap.fee_bps, BPS_DENOMINATOR
            )));
        }

        if self.swap.protocol_share_bps > MAX_BPS {
            return Err(SteammError::config(format!(
                "swap.protocol_share_bps {} exceeds {}",
                self.swap.protocol_share_bps, MAX_BPS
            )));
        }

        if self.swap.max_in_safety_margin_bps > MAX_BPS {
            return Err(SteammError::config(format!(
                "swap.max_in_safety_margin_bps {} exceeds {}",
                self.swap.max_in_safety_margin_bps, MAX_BPS
            )));
        }

        if self.redemption.fee_bps > BPS_DENOMINATOR {
            return Err(SteammError::config(format!(
                "redemption.fee_bps {} exceeds {}",
                self.redemption.fee_bps, BPS_DENOMINATOR
            )));
        }

        validate_utilisation_band(
            self.bank.target_utilisation_bps,
            self.bank.utilisation_buffer_bps,
        )?;

        Ok(())
    }

    pub fn swap_fee_config(&self) -> CoreResult<SwapFeeConfig> {
        SwapFeeConfig::new(
            FeeConfig::from_bps(self.swap.fee_bps, self.swap.min_fee)?,
            self.swap.protocol_share_bps,
        )
    }

    pub fn redemption_fee_config(&self) -> CoreResult<FeeConfig> {
        FeeConfig::from_bps(self.redemption.fee_bps, self.redemption.min_fee)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            swap: SwapSection {
                fee_bps: DEFAULT_SWAP_FEE_BPS,
                min_fee: 0,
                protocol_share_bps: DEFAULT_PROTOCOL_SHARE_BPS,
                max_in_safety_margin_bps: DEFAULT_MAX_IN_SAFETY_MARGIN_BPS,
            },
            redemption: RedemptionSection {
                fee_bps: DEFAULT_REDEMPTION_FEE_BPS,
                min_fee: 0,
            },
            bank: BankSection {
                target_utilisation_bps: DEFAULT_TARGET_UTILISATION_BPS,
                utilisation_buffer_bps: DEFAULT_UTILISATION_BUFFER_BPS,
            },
        }
    }
}
