//! Module containing common types and functions used throughout the crate.

use std::fmt::Debug;

use alloy_primitives::{Address, B256};
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

/// A 32 byte hash. Reuses alloy's primitive rather than a hand-rolled byte array.
pub type Hash32 = B256;

/// A 20 byte address.
pub type Address20 = Address;

/// A variable-length byte string that always displays, debugs and (de)serializes
/// as lowercase `0x`-prefixed hex, mirroring magi's `RawTransaction`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ByteString(pub Vec<u8>);

impl ByteString {
    /// Builds a [ByteString] from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Ok(ByteString(hex::decode(s)?))
    }

    /// Renders as a lowercase `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for ByteString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ByteString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(deserializer)?;
        ByteString::from_hex(&s).map_err(D::Error::custom)
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(v: Vec<u8>) -> Self {
        ByteString(v)
    }
}

/// Selected block header info, reused across L1 and L2 contexts.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockInfo {
    /// The block hash
    pub hash: B256,
    /// The block number
    pub number: u64,
    /// The parent block hash
    pub parent_hash: B256,
    /// The block timestamp
    pub timestamp: u64,
}

/// A single L1 epoch's attributes, as carried into the L2 block's L1-attributes
/// deposit (see `deposit::l1_attributes`).
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Epoch {
    /// The L1 block number
    pub number: u64,
    /// The L1 block hash
    pub hash: B256,
    /// The L1 block timestamp
    pub timestamp: u64,
    /// The L1 block's base fee, used for the L2 base-fee scalar fields
    pub base_fee: u64,
}
