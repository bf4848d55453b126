//! Configuration (spec.md §6 "Configuration"), layered the way magi's
//! `config::Config` does: a TOML file merged with environment variables
//! merged with CLI flags, via `figment`.

use std::path::PathBuf;
use std::str::FromStr;

use alloy_primitives::Address;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::deposit::Predeploys;
use crate::detector::EsipConfig;

/// Top-level indexer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// L1 (source chain) RPC URL
    pub l1_rpc_url: String,
    /// L2 execution engine RPC URL
    pub l2_engine_url: String,
    /// JWT secret (hex) for authenticating against the L2 engine
    pub jwt_secret: String,
    /// Reference-feed base URL, consulted only when validation is enabled
    pub reference_feed_url: String,
    /// Predeployed contract addresses
    pub chain: ChainConfig,
    /// ESIP activation block numbers
    pub esips: EsipConfig,
    /// Whether the validation engine runs at all (`VALIDATION_ENABLED`)
    pub validation_enabled: bool,
    /// How many L1 blocks the prefetcher looks ahead (`L1_PREFETCH_FORWARD`)
    pub l1_prefetch_forward: u64,
    /// Prefetcher worker count (`L1_PREFETCH_THREADS`)
    pub l1_prefetch_threads: usize,
    /// Validation worker count (`VALIDATION_THREADS`)
    pub validation_threads: usize,
    /// Blocks behind the L2 tip startup recovery must walk back to (default 63)
    pub retry_offset: u64,
    /// SQLite database path for the `ValidationResult` store
    pub data_dir: PathBuf,
}

/// Predeployed contract addresses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The Ethscriptions registry predeploy
    pub ethscriptions: Address,
    /// The L1-attributes predeploy
    pub l1_block: Address,
    /// The account that signs L1-attributes deposits
    pub attributes_depositor: Address,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            ethscriptions: addr("0x4200000000000000000000000000000000000066"),
            l1_block: addr("0x4200000000000000000000000000000000000015"),
            attributes_depositor: addr("0xdeaddeaddeaddeaddeaddeaddeaddeaddead0001"),
        }
    }
}

impl From<ChainConfig> for Predeploys {
    fn from(value: ChainConfig) -> Self {
        Predeploys {
            ethscriptions: value.ethscriptions,
            l1_block: value.l1_block,
            attributes_depositor: value.attributes_depositor,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            l1_rpc_url: String::new(),
            l2_engine_url: String::new(),
            jwt_secret: String::new(),
            reference_feed_url: String::new(),
            chain: ChainConfig::default(),
            esips: EsipConfig::default(),
            validation_enabled: false,
            l1_prefetch_forward: 20,
            l1_prefetch_threads: 2,
            validation_threads: 10,
            retry_offset: 63,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file, then environment variables, then
    /// an already-constructed CLI-derived override — the same three-layer
    /// precedence magi's config loader uses.
    pub fn load(config_path: &std::path::Path, cli_overrides: impl Serialize) -> eyre::Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::raw().only(&[
                "VALIDATION_ENABLED",
                "L1_PREFETCH_FORWARD",
                "L1_PREFETCH_THREADS",
                "VALIDATION_THREADS",
            ]))
            .merge(Serialized::defaults(cli_overrides));
        Ok(figment.extract()?)
    }
}

fn addr(s: &str) -> Address {
    Address::from_str(s).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.l1_prefetch_forward, 20);
        assert_eq!(config.retry_offset, 63);
    }
}
