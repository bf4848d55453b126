//! # ethscriptions-indexer
//!
//! An indexer/sequencer for the Ethscriptions protocol: it watches L1
//! (Ethereum) blocks, detects ethscription-forming transactions and events,
//! extracts higher-level protocol semantics (token mints/deploys, collection
//! mints, and a generic typed-value tier), and derives a canonical L2 chain
//! of OP-Stack-style deposit transactions from them. An optional validation
//! engine cross-checks the derived L2 state against a reference feed.
//!
//! ## Modules
//!
//! - [`common`]: Shared primitive types used throughout the crate.
//! - [`types`]: L1/L2 block and transaction shapes, the [`types::Operation`] enum,
//!   the deposit transaction envelope, and validation results.
//! - [`codec`]: Data-URI parsing and hex/UTF-8 decoding for ethscription content.
//! - [`protocol`]: The three-tier protocol extractor (token / collections / generic).
//! - [`detector`]: Ethscription detection from L1 transactions and logs.
//! - [`deposit`]: Builds deterministic deposit transactions from detected operations.
//! - [`l1`]: L1 ingestion and the bounded look-ahead prefetcher.
//! - [`driver`]: Drives block import against the L2 engine, including reorg handling.
//! - [`engine`]: The L2 engine client (block proposal, L1-attributes lookup).
//! - [`validation`]: Cross-checks derived L2 state against a reference feed.
//! - [`config`]: Layered configuration (TOML + env + CLI) via `figment`.
//! - [`telemetry`]: Logging and graceful shutdown.
//! - [`version`]: Crate version information.
#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod codec;
pub mod common;
pub mod config;
pub mod deposit;
pub mod detector;
pub mod driver;
pub mod engine;
pub mod l1;
pub mod protocol;
pub mod telemetry;
pub mod types;
pub mod validation;
pub mod version;
