// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # txwire: Transaction Types and Wire Codec
//!
//! Every transaction on the network is a short binary blob: a fixed header,
//! a type-specific payload, and a tail of signatures. This crate knows what
//! those blobs may contain and refuses everything else.
//!
//! The center of it is the [`TransactionRegistry`](transaction::TransactionRegistry):
//! a map from `(type group, type id)` to a codec that knows that type's
//! payload. The eleven core types are registered out of the box; plugins
//! bring their own codecs under their own type groups.
//!
//! ## Architecture
//!
//! - **config**: Wire constants, schema limits, and per-network parameters.
//! - **crypto**: Ed25519 keys and signatures, SHA-256 and BLAKE3. Don't roll your own.
//! - **identity**: Recipient addresses. Bech32 for humans, 21 bytes for the wire.
//! - **transaction**: Types, registry, codec, builder, signing, verification, fees.
//!
//! ## Design Philosophy
//!
//! 1. Bytes from strangers are hostile. Decoding never panics, and never
//!    allocates based on a length it hasn't checked against the input.
//! 2. One canonical encoding per transaction. If two byte strings decode to
//!    the same value, one of them was rejected.
//! 3. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod transaction;

pub use transaction::{decode, encode, CodecError, Transaction, TransactionRegistry};
