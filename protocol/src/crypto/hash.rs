//! # Hashing Utilities
//!
//! Two hash functions, each with exactly one job:
//!
//! - **SHA-256**: transaction IDs, signing hashes and HTLC secrets. These
//!   values leave the process (explorers, other chains' HTLC contracts), so
//!   they use the hash everybody else already speaks.
//! - **BLAKE3**: address derivation. Internal to the protocol, so we take
//!   the faster one.

use sha2::{Digest, Sha256};

use crate::config::ADDRESS_HASH_LENGTH;

/// SHA-256 of `data` as a fixed-size array.
///
/// # Example
///
/// ```
/// use txwire::crypto::sha256;
///
/// let hash = sha256(b"txwire");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// BLAKE3 of `data`.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// The 20-byte key hash embedded in an address: the first twenty bytes of
/// `BLAKE3(public_key)`.
pub fn address_hash(public_key: &[u8]) -> [u8; ADDRESS_HASH_LENGTH] {
    let digest = blake3_hash(public_key);
    let mut out = [0u8; ADDRESS_HASH_LENGTH];
    out.copy_from_slice(&digest[..ADDRESS_HASH_LENGTH]);
    out
}
