//! Tier 1: the `erc-20`-style token extractor (spec.md §4.B.1).
//!
//! Pure regex, anchored `\A…\z`, exact byte match against two fixed templates.
//! Any deviation — whitespace, key reorder, extra fields, non-string numerics —
//! falls through to the empty triple.

use once_cell::sync::Lazy;
use regex::Regex;

use super::abi::{encode_tuple, uint256};

const TICK: &str = "[a-z0-9]{1,28}";
const NUM: &str = r"(?:0|[1-9]\d*)";

static MINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^\{{"p":"erc-20","op":"mint","tick":"({TICK})","id":"({NUM})","amt":"({NUM})"\}}$"#
    ))
    .unwrap()
});

static DEPLOY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^\{{"p":"erc-20","op":"deploy","tick":"({TICK})","max":"({NUM})","lim":"({NUM})"\}}$"#
    ))
    .unwrap()
});

/// Result of a successful token-tier extraction.
#[derive(Debug)]
pub struct TokenExtraction {
    /// Always `"erc-20"` for this tier
    pub protocol: String,
    /// `"mint"` or `"deploy"`
    pub operation: String,
    /// The `(string op, string protocol, string tick, uint256 v1, uint256 v2, uint256 v3)` tuple,
    /// unencoded — the deposit builder nests this inside the create calldata's outer tuple.
    pub params_tuple: alloy_dyn_abi::DynSolValue,
    /// ABI-encoded standalone form of `params_tuple`
    pub encoded_params: Vec<u8>,
}

/// The zero-valued token params tuple, used by the deposit builder when an
/// ethscription's content carries no token-tier payload.
pub fn zero_params_tuple() -> alloy_dyn_abi::DynSolValue {
    use alloy_dyn_abi::DynSolValue;
    DynSolValue::Tuple(vec![
        DynSolValue::String(String::new()),
        DynSolValue::String(String::new()),
        DynSolValue::String(String::new()),
        uint256("0").unwrap(),
        uint256("0").unwrap(),
        uint256("0").unwrap(),
    ])
}

/// Attempts to match `payload` against the mint/deploy templates, in that order.
pub fn extract(payload: &str) -> Option<TokenExtraction> {
    if let Some(caps) = MINT_RE.captures(payload) {
        let tick = &caps[1];
        let id = uint256(&caps[2])?;
        let amt = uint256(&caps[3])?;
        return Some(build("mint", tick, id, uint256("0")?, amt));
    }
    if let Some(caps) = DEPLOY_RE.captures(payload) {
        let tick = &caps[1];
        let max = uint256(&caps[2])?;
        let lim = uint256(&caps[3])?;
        return Some(build("deploy", tick, max, uint256("0")?, lim));
    }
    None
}

fn build(
    op: &str,
    tick: &str,
    v1: alloy_dyn_abi::DynSolValue,
    v2: alloy_dyn_abi::DynSolValue,
    v3: alloy_dyn_abi::DynSolValue,
) -> TokenExtraction {
    use alloy_dyn_abi::DynSolValue;
    let params_tuple = DynSolValue::Tuple(vec![
        DynSolValue::String(op.to_string()),
        DynSolValue::String("erc-20".to_string()),
        DynSolValue::String(tick.to_string()),
        v1,
        v2,
        v3,
    ]);
    let encoded_params = encode_tuple(match &params_tuple {
        DynSolValue::Tuple(v) => v.clone(),
        _ => unreachable!(),
    });
    TokenExtraction {
        protocol: "erc-20".to_string(),
        operation: op.to_string(),
        params_tuple,
        encoded_params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_mint() {
        let payload = r#"{"p":"erc-20","op":"mint","tick":"punk","id":"1","amt":"100"}"#;
        let result = extract(payload).unwrap();
        assert_eq!(result.protocol, "erc-20");
        assert_eq!(result.operation, "mint");
        let alloy_dyn_abi::DynSolValue::Tuple(fields) = &result.params_tuple else {
            panic!("expected a tuple");
        };
        assert_eq!(
            fields,
            &[
                alloy_dyn_abi::DynSolValue::String("mint".to_string()),
                alloy_dyn_abi::DynSolValue::String("erc-20".to_string()),
                alloy_dyn_abi::DynSolValue::String("punk".to_string()),
                uint256("1").unwrap(),
                uint256("0").unwrap(),
                uint256("100").unwrap(),
            ]
        );
    }

    #[test]
    fn reordered_keys_fail() {
        let payload = r#"{"op":"mint","p":"erc-20","tick":"punk","id":"1","amt":"100"}"#;
        assert!(extract(payload).is_none());
    }

    #[test]
    fn extra_whitespace_fails() {
        let payload = r#"{"p": "erc-20","op":"mint","tick":"punk","id":"1","amt":"100"}"#;
        assert!(extract(payload).is_none());
    }

    #[test]
    fn leading_zero_amount_fails() {
        let payload = r#"{"p":"erc-20","op":"mint","tick":"punk","id":"1","amt":"0100"}"#;
        assert!(extract(payload).is_none());
    }

    #[test]
    fn deploy_golden() {
        let payload = r#"{"p":"erc-20","op":"deploy","tick":"punk","max":"21000000","lim":"1000"}"#;
        let result = extract(payload).unwrap();
        assert_eq!(result.operation, "deploy");
        let alloy_dyn_abi::DynSolValue::Tuple(fields) = &result.params_tuple else {
            panic!("expected a tuple");
        };
        assert_eq!(
            fields,
            &[
                alloy_dyn_abi::DynSolValue::String("deploy".to_string()),
                alloy_dyn_abi::DynSolValue::String("erc-20".to_string()),
                alloy_dyn_abi::DynSolValue::String("punk".to_string()),
                uint256("21000000").unwrap(),
                uint256("0").unwrap(),
                uint256("1000").unwrap(),
            ]
        );
    }
}
