//! Tier 3: the type-inferring generic extractor (spec.md §4.B.3).

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, B256, U256};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::abi::encode_tuple;

const MAX_DEPTH: u32 = 5;
const MAX_STRING_LEN: usize = 1000;
const MAX_ARRAY_LEN: usize = 100;
const MAX_OBJECT_KEYS: usize = 20;
const MAX_PAYLOAD_BYTES: usize = 10 * 1024;

static PROTO_OP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_-]{1,50}$").unwrap());
static UINT_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0|[1-9]\d*)$").unwrap());

/// Result of a successful generic-tier extraction.
#[derive(Debug)]
pub struct GenericExtraction {
    /// The payload's `"p"` field
    pub protocol: String,
    /// The payload's `"op"` field
    pub operation: String,
    /// ABI-encoded top-level tuple of the remaining fields, in JSON key order
    pub encoded_params: Vec<u8>,
}

/// Parses `payload` as JSON, validates `p`/`op`, and type-infers every other
/// top-level field into a single ABI-encoded tuple.
pub fn extract(payload: &str) -> Option<GenericExtraction> {
    if payload.len() > MAX_PAYLOAD_BYTES {
        return None;
    }
    let value: Value = serde_json::from_str(payload).ok()?;
    let obj = value.as_object()?;
    if obj.len() > MAX_OBJECT_KEYS {
        return None;
    }

    let protocol = obj.get("p")?.as_str()?;
    let operation = obj.get("op")?.as_str()?;
    if !PROTO_OP_RE.is_match(protocol) || !PROTO_OP_RE.is_match(operation) {
        return None;
    }

    let mut values = Vec::new();
    for (key, field) in obj {
        if key == "p" || key == "op" {
            continue;
        }
        values.push(infer(field, 1)?);
    }

    Some(GenericExtraction {
        protocol: protocol.to_string(),
        operation: operation.to_string(),
        encoded_params: encode_tuple(values),
    })
}

/// Infers a [DynSolValue] for one JSON value, per the ordered rules in
/// spec.md §4.B.3.
fn infer(value: &Value, depth: u32) -> Option<DynSolValue> {
    if depth > MAX_DEPTH {
        return None;
    }
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(DynSolValue::Bool(*b)),
        Value::Number(n) => {
            // Integer literal => uint256; decimal => reject.
            let u = n.as_u64()?;
            Some(DynSolValue::Uint(U256::from(u), 256))
        }
        Value::String(s) => infer_string(s),
        Value::Array(arr) => infer_array(arr, depth),
        Value::Object(map) => infer_object(map, depth),
    }
}

fn infer_string(s: &str) -> Option<DynSolValue> {
    if s.len() > MAX_STRING_LEN {
        return None;
    }
    if UINT_STRING_RE.is_match(s) {
        if let Ok(v) = U256::from_str_radix(s, 10) {
            return Some(DynSolValue::Uint(v, 256));
        }
    }
    if let Some(hex_body) = s.strip_prefix("0x") {
        let lower = hex_body.to_lowercase();
        if hex_body == lower && hex_body.len() % 2 == 0 {
            if let Ok(bytes) = hex::decode(&lower) {
                return Some(match bytes.len() {
                    20 => DynSolValue::Address(Address::from_slice(&bytes)),
                    32 => DynSolValue::FixedBytes(B256::from_slice(&bytes), 32),
                    n if (1..=32).contains(&n) => {
                        let mut word = [0u8; 32];
                        word[..n].copy_from_slice(&bytes);
                        DynSolValue::FixedBytes(B256::from(word), n)
                    }
                    _ => DynSolValue::String(s.to_string()),
                });
            }
        }
    }
    Some(DynSolValue::String(s.to_string()))
}

/// A 2-element `[typeName, value]` array overrides inference entirely.
fn as_type_hint(arr: &[Value]) -> Option<DynSolValue> {
    if arr.len() != 2 {
        return None;
    }
    let type_name = arr[0].as_str()?;
    let ty = DynSolType::parse(type_name).ok()?;
    ty.coerce_json(&arr[1]).ok()
}

fn infer_array(arr: &[Value], depth: u32) -> Option<DynSolValue> {
    if let Some(hinted) = as_type_hint(arr) {
        return Some(hinted);
    }
    if arr.len() > MAX_ARRAY_LEN {
        return None;
    }
    if arr.is_empty() {
        return None;
    }

    if arr.iter().all(|v| v.is_object()) {
        let rows: Option<Vec<DynSolValue>> = arr
            .iter()
            .map(|v| infer_object(v.as_object().unwrap(), depth + 1))
            .collect();
        return Some(DynSolValue::Array(rows?));
    }

    if arr.iter().all(|v| v.is_array()) {
        let rows: Option<Vec<DynSolValue>> = arr
            .iter()
            .map(|v| infer_array(v.as_array().unwrap(), depth + 1))
            .collect();
        let rows = rows?;
        let first_ty = rows.first()?.as_type();
        if rows.iter().all(|r| r.as_type() == first_ty) {
            return Some(DynSolValue::Array(rows));
        }
        return None;
    }

    let elements: Option<Vec<DynSolValue>> = arr.iter().map(|v| infer(v, depth + 1)).collect();
    let elements = elements?;
    let first_ty = elements.first()?.as_type();
    if elements.iter().all(|e| e.as_type() == first_ty) {
        Some(DynSolValue::Array(elements))
    } else {
        None
    }
}

fn infer_object(map: &serde_json::Map<String, Value>, depth: u32) -> Option<DynSolValue> {
    if map.len() > MAX_OBJECT_KEYS {
        return None;
    }
    let mut values = Vec::with_capacity(map.len());
    for (_, v) in map {
        values.push(infer(v, depth + 1)?);
    }
    Some(DynSolValue::Tuple(values))
}
