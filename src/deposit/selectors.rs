//! Function selectors for the predeployed Ethscriptions contract calls
//! (spec.md §4.D). Each selector is the first 4 bytes of `keccak256(signature)`,
//! computed once and cached in a `once_cell::sync::Lazy` — the same pattern
//! magi uses for `CONFIG_UPDATE_TOPIC`/`TRANSACTION_DEPOSITED_TOPIC`.

use alloy_primitives::keccak256;
use once_cell::sync::Lazy;

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// `createEthscription((bytes32,bytes32,address,bytes,string,string,string,bool,bool,(string,string,string,uint256,uint256,uint256)))`
pub static CREATE_ETHSCRIPTION: Lazy<[u8; 4]> = Lazy::new(|| {
    selector(
        "createEthscription((bytes32,bytes32,address,bytes,string,string,string,bool,bool,(string,string,string,uint256,uint256,uint256)))",
    )
});

/// `transferEthscription(address,bytes32)`
pub static TRANSFER_ETHSCRIPTION: Lazy<[u8; 4]> =
    Lazy::new(|| selector("transferEthscription(address,bytes32)"));

/// `transferEthscriptionForPreviousOwner(address,bytes32,address)`
pub static TRANSFER_ETHSCRIPTION_FOR_PREVIOUS_OWNER: Lazy<[u8; 4]> =
    Lazy::new(|| selector("transferEthscriptionForPreviousOwner(address,bytes32,address)"));

/// `setL1BlockValues(uint64,uint64,uint64,bytes32,uint64)` — the per-block
/// L1-attributes deposit target on the L1_BLOCK predeploy.
pub static SET_L1_BLOCK_VALUES: Lazy<[u8; 4]> =
    Lazy::new(|| selector("setL1BlockValues(uint64,uint64,uint64,bytes32,uint64)"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_four_bytes_and_distinct() {
        assert_ne!(*CREATE_ETHSCRIPTION, *TRANSFER_ETHSCRIPTION);
        assert_ne!(
            *TRANSFER_ETHSCRIPTION,
            *TRANSFER_ETHSCRIPTION_FOR_PREVIOUS_OWNER
        );
    }
}
