//! Data-URI and hex codec (component A, spec.md §4.A).
//!
//! Decoding here is deliberately lossless and never percent-decodes: the raw
//! decoded bytes feed into hashing (source-hash, `contentUriHash`), so any
//! normalisation beyond what the spec names would silently change consensus.

pub mod data_uri;
pub mod hex_utf8;

pub use data_uri::{parse, DataUri};
pub use hex_utf8::{bytes_to_utf8, hex_to_utf8};
