//! ESIP feature-flag activation, gated by L1 block number.
//!
//! Mirrors how magi's `ChainConfig` gates Ecotone/Canyon/Regolith activation
//! by comparing a block's timestamp against a configured threshold — here the
//! comparison is against L1 block number instead, per spec.md §4.C.

use serde::{Deserialize, Serialize};

/// Per-ESIP activation block numbers. `None` means "never activated" (useful
/// for test fixtures that want to pin a single ESIP on in isolation).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EsipConfig {
    /// ESIP-1: plain `TransferEthscription` events
    pub esip1_block: Option<u64>,
    /// ESIP-2: `TransferEthscriptionForPreviousOwner` events
    pub esip2_block: Option<u64>,
    /// ESIP-3: event-based `CreateEthscription`
    pub esip3_block: Option<u64>,
    /// ESIP-5: variable-length (not just 64-char) input-based multi-transfers
    pub esip5_block: Option<u64>,
    /// ESIP-6: duplicate-content-tolerant creates
    pub esip6_block: Option<u64>,
    /// ESIP-7: gzip-compressed content URIs
    pub esip7_block: Option<u64>,
}

impl EsipConfig {
    fn active(flag: Option<u64>, block_number: u64) -> bool {
        flag.is_some_and(|activation| block_number >= activation)
    }

    /// True if ESIP-1 (plain transfer events) applies at `block_number`.
    pub fn esip1(&self, block_number: u64) -> bool {
        Self::active(self.esip1_block, block_number)
    }

    /// True if ESIP-2 (transfer-for-previous-owner events) applies at `block_number`.
    pub fn esip2(&self, block_number: u64) -> bool {
        Self::active(self.esip2_block, block_number)
    }

    /// True if ESIP-3 (event-based creates) applies at `block_number`.
    pub fn esip3(&self, block_number: u64) -> bool {
        Self::active(self.esip3_block, block_number)
    }

    /// True if ESIP-5 (variable-length multi-transfers) applies at `block_number`.
    pub fn esip5(&self, block_number: u64) -> bool {
        Self::active(self.esip5_block, block_number)
    }

    /// True if ESIP-6 (duplicate-content tolerance) applies at `block_number`.
    pub fn esip6(&self, block_number: u64) -> bool {
        Self::active(self.esip6_block, block_number)
    }

    /// True if ESIP-7 (gzip content) applies at `block_number`.
    pub fn esip7(&self, block_number: u64) -> bool {
        Self::active(self.esip7_block, block_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_monotonic() {
        let config = EsipConfig {
            esip1_block: Some(100),
            ..Default::default()
        };
        assert!(!config.esip1(99));
        assert!(config.esip1(100));
        assert!(config.esip1(101));
    }

    #[test]
    fn unset_flag_never_activates() {
        let config = EsipConfig::default();
        assert!(!config.esip1(u64::MAX));
    }
}
