//! Shared ABI re-encoding helpers (component B).
//!
//! Ethscriptions' nested sub-protocols are only typed at runtime — a JSON
//! object's shape decides its Solidity tuple type. `alloy-dyn-abi`'s
//! [`DynSolValue`] is the natural extension of the crate's `alloy-primitives`/
//! `alloy-rlp` stack for exactly this "ABI-encode a runtime-typed value" case
//! (see SPEC_FULL.md §4.B).

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;

/// Builds a `uint256` value from a decimal string already validated to be
/// `0 | [1-9]\d*` and `<= uint256::MAX`.
pub fn uint256(decimal: &str) -> Option<DynSolValue> {
    let value = U256::from_str_radix(decimal, 10).ok()?;
    Some(DynSolValue::Uint(value, 256))
}

/// ABI-encodes a tuple's member values as the parameters of a function call
/// (32-byte heads, dynamic-tail offsets — no selector).
pub fn encode_tuple(values: Vec<DynSolValue>) -> Vec<u8> {
    DynSolValue::Tuple(values).abi_encode_params()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint256_parses_decimal() {
        let v = uint256("100").unwrap();
        assert_eq!(v, DynSolValue::Uint(U256::from(100u64), 256));
    }

    #[test]
    fn uint256_rejects_non_numeric() {
        assert!(uint256("abc").is_none());
    }
}
