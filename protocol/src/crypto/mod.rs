//! # Cryptographic Primitives
//!
//! Everything the codec needs to talk about keys, signatures and hashes:
//!
//! - **Ed25519** for signatures: fast, deterministic, fixed-size.
//! - **SHA-256** for transaction IDs, signing hashes and HTLC secrets.
//! - **BLAKE3** for address derivation.
//!
//! We don't roll our own. Everything here is a thin, type-safe wrapper
//! around audited implementations.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{address_hash, blake3_hash, sha256};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
pub use signatures::{sign_hash, verify_hash};
