//! # Digital Signatures
//!
//! Ed25519 signing and verification over 32-byte message hashes.
//!
//! Transactions are never signed directly: the signer hashes the relevant
//! serialization with SHA-256 and signs the digest. That keeps the signed
//! message a fixed size no matter how many payments a multipayment carries,
//! and lets hardware signers show the user a short hash.

use super::keys::{Keypair, PublicKey, Signature};

/// Sign a 32-byte digest.
pub fn sign_hash(keypair: &Keypair, hash: &[u8; 32]) -> Signature {
    keypair.sign(hash)
}

/// Verify a signature over a 32-byte digest. `true` means valid.
pub fn verify_hash(public_key: &PublicKey, hash: &[u8; 32], signature: &Signature) -> bool {
    public_key.verify(hash, signature)
}
