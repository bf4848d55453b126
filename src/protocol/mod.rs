//! Protocol extractor (component B, spec.md §4.B).
//!
//! Three tiers, tried in order of strictness; the first that produces a
//! non-empty result wins. Any failure — at any tier — falls through to the
//! next, and falling through all three yields the empty `("", "", "")`
//! sentinel rather than an error (spec.md §7: `ExtractionError` is swallowed
//! locally).

pub mod abi;
pub mod collections;
pub mod generic;
pub mod token;

/// The `(protocol, operation, encoded_params)` triple every tier returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    /// Sub-protocol name, e.g. `"erc-20"`, `"collections"`, or a generic `p` value
    pub protocol: String,
    /// Operation name, e.g. `"mint"`, `"lock_collection"`
    pub operation: String,
    /// ABI-encoded parameter tuple, empty when extraction failed
    pub encoded_params: Vec<u8>,
}

impl Extraction {
    /// True when this is the `("", "", "")` empty-triple sentinel.
    pub fn is_empty(&self) -> bool {
        self.protocol.is_empty() && self.operation.is_empty() && self.encoded_params.is_empty()
    }
}

/// Runs the three-tier extractor against a decoded content payload.
pub fn extract(payload: &str) -> Extraction {
    if let Some(t) = token::extract(payload) {
        return Extraction {
            protocol: t.protocol,
            operation: t.operation,
            encoded_params: t.encoded_params,
        };
    }
    if let Some(c) = collections::extract(payload) {
        return Extraction {
            protocol: c.protocol,
            operation: c.operation,
            encoded_params: c.encoded_params,
        };
    }
    if let Some(g) = generic::extract(payload) {
        return Extraction {
            protocol: g.protocol,
            operation: g.operation,
            encoded_params: g.encoded_params,
        };
    }
    Extraction::default()
}
