//! Tier 2: the collections extractor (spec.md §4.B.2).
//!
//! Each operation carries a strict schema: the JSON object's key list must
//! equal `["p","op"] + schema.keys` *exactly*, in order, with no extra keys.
//! Per-field validators enforce types without silent coercion.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::B256;
use serde_json::Value;

use super::abi::{encode_tuple, uint256};

/// The field-level validators named in spec.md §4.B.2.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldType {
    String,
    Uint256,
    Bytes32,
    Bytes32Array,
    ItemsArray,
    AttributesArray,
}

struct Schema {
    operation: &'static str,
    fields: &'static [(&'static str, FieldType)],
}

const SCHEMAS: &[Schema] = &[
    Schema {
        operation: "create_collection",
        fields: &[
            ("name", FieldType::String),
            ("description", FieldType::String),
            ("logo_image_uri", FieldType::String),
        ],
    },
    Schema {
        operation: "add_items_batch",
        fields: &[
            ("collection_id", FieldType::Bytes32),
            ("items", FieldType::ItemsArray),
        ],
    },
    Schema {
        operation: "remove_items",
        fields: &[
            ("collection_id", FieldType::Bytes32),
            ("ids", FieldType::Bytes32Array),
        ],
    },
    Schema {
        operation: "edit_collection",
        fields: &[
            ("collection_id", FieldType::Bytes32),
            ("name", FieldType::String),
            ("description", FieldType::String),
        ],
    },
    Schema {
        operation: "edit_collection_item",
        fields: &[
            ("collection_id", FieldType::Bytes32),
            ("item_index", FieldType::Uint256),
            ("attributes", FieldType::AttributesArray),
        ],
    },
    Schema {
        operation: "lock_collection",
        fields: &[("collection_id", FieldType::Bytes32)],
    },
    Schema {
        operation: "sync_ownership",
        fields: &[("collection_id", FieldType::Bytes32)],
    },
];

/// Result of a successful collections-tier extraction.
#[derive(Debug)]
pub struct CollectionsExtraction {
    /// Always `"collections"`
    pub protocol: String,
    /// One of the operation names in [SCHEMAS]
    pub operation: String,
    /// ABI-encoded tuple matching the operation's schema field order
    pub encoded_params: Vec<u8>,
}

/// Parses and validates `payload` against the collections schema table.
pub fn extract(payload: &str) -> Option<CollectionsExtraction> {
    let value: Value = serde_json::from_str(payload).ok()?;
    let obj = value.as_object()?;

    let op = obj.get("op")?.as_str()?;
    let schema = SCHEMAS.iter().find(|s| s.operation == op)?;
    if obj.get("p")?.as_str()? != "collections" {
        return None;
    }

    let expected_keys: Vec<&str> = std::iter::once("p")
        .chain(std::iter::once("op"))
        .chain(schema.fields.iter().map(|(k, _)| *k))
        .collect();
    let actual_keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
    if actual_keys != expected_keys {
        return None;
    }

    let mut values = Vec::with_capacity(schema.fields.len());
    for (key, ty) in schema.fields {
        let field = obj.get(*key)?;
        values.push(validate_field(field, *ty)?);
    }

    Some(CollectionsExtraction {
        protocol: "collections".to_string(),
        operation: op.to_string(),
        encoded_params: encode_tuple(values),
    })
}

fn validate_field(value: &Value, ty: FieldType) -> Option<DynSolValue> {
    match ty {
        FieldType::String => Some(DynSolValue::String(value.as_str()?.to_string())),
        FieldType::Uint256 => uint256(value.as_str()?),
        FieldType::Bytes32 => Some(DynSolValue::FixedBytes(parse_bytes32(value.as_str()?)?, 32)),
        FieldType::Bytes32Array => {
            let arr = value.as_array()?;
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                out.push(DynSolValue::FixedBytes(parse_bytes32(item.as_str()?)?, 32));
            }
            Some(DynSolValue::Array(out))
        }
        FieldType::ItemsArray => {
            let arr = value.as_array()?;
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                let item = item.as_object()?;
                let id = parse_bytes32(item.get("id")?.as_str()?)?;
                let weight = uint256(item.get("weight")?.as_str()?)?;
                out.push(DynSolValue::Tuple(vec![
                    DynSolValue::FixedBytes(id, 32),
                    weight,
                ]));
            }
            Some(DynSolValue::Array(out))
        }
        FieldType::AttributesArray => {
            let arr = value.as_array()?;
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                let item = item.as_object()?;
                let trait_type = item.get("trait_type")?.as_str()?.to_string();
                let val = item.get("value")?.as_str()?.to_string();
                out.push(DynSolValue::Tuple(vec![
                    DynSolValue::String(trait_type),
                    DynSolValue::String(val),
                ]));
            }
            Some(DynSolValue::Array(out))
        }
    }
}

fn parse_bytes32(s: &str) -> Option<alloy_primitives::B256> {
    let s = s.strip_prefix("0x")?;
    if s.len() != 64 {
        return None;
    }
    let bytes = hex::decode(s).ok()?;
    Some(B256::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_collection_golden() {
        let id = "0x".to_string() + &"ab".repeat(32);
        let payload = format!(r#"{{"p":"collections","op":"lock_collection","collection_id":"{id}"}}"#);
        let result = extract(&payload).unwrap();
        assert_eq!(result.operation, "lock_collection");
    }

    #[test]
    fn extra_key_fails() {
        let id = "0x".to_string() + &"ab".repeat(32);
        let payload = format!(
            r#"{{"p":"collections","op":"lock_collection","collection_id":"{id}","extra":"x"}}"#
        );
        assert!(extract(&payload).is_none());
    }

    #[test]
    fn wrong_key_order_fails() {
        let id = "0x".to_string() + &"ab".repeat(32);
        let payload = format!(r#"{{"op":"lock_collection","p":"collections","collection_id":"{id}"}}"#);
        assert!(extract(&payload).is_none());
    }

    #[test]
    fn create_collection_requires_string_fields() {
        let payload = r#"{"p":"collections","op":"create_collection","name":"Punks","description":"desc","logo_image_uri":"ipfs://x"}"#;
        let result = extract(payload).unwrap();
        assert_eq!(result.operation, "create_collection");
    }

    #[test]
    fn unknown_operation_fails() {
        let payload = r#"{"p":"collections","op":"teleport_collection"}"#;
        assert!(extract(payload).is_none());
    }
}
