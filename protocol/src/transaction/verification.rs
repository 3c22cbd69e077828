//! Transaction verification: structural checks and cryptographic validation.
//!
//! Every transaction entering the pool or proposed in a block must pass
//! [`verify_transaction`]. The checks are ordered from cheapest to most
//! expensive to fail fast and waste minimal CPU on invalid transactions.
//!
//! Second signatures and multi-signature wallets depend on account state
//! (which second key did the sender register, who are the wallet's
//! participants), so they have their own entry points that take that state
//! as an argument: [`verify_second_signature`] and
//! [`verify_multi_signatures`].

use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use super::builder::Transaction;
use super::codec::{CodecError, SerializeOptions};
use super::registry::TransactionRegistry;
use super::types::{Asset, MultiSignatureAsset};
use crate::config::{network_name, NetworkConfig, MAX_FUTURE_SECONDS};
use crate::crypto::keys::PublicKey;
use crate::crypto::signatures::verify_hash;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during transaction verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The transaction belongs to another network.
    #[error("wrong network: expected {expected}, got {actual}")]
    NetworkMismatch { expected: String, actual: String },

    /// The transaction doesn't satisfy its type's schema.
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("transaction has no sender public key")]
    MissingSenderPublicKey,

    /// The transaction is not signed (signature field is `None`).
    #[error("transaction is unsigned")]
    MissingSignature,

    /// The Ed25519 signature does not verify against the sender's public key.
    #[error("invalid signature: does not verify against sender {sender}")]
    InvalidSignature { sender: String },

    #[error("transaction has no second signature")]
    MissingSecondSignature,

    #[error("invalid second signature")]
    InvalidSecondSignature,

    /// The transaction timestamp is too far in the future.
    #[error("timestamp {timestamp} is {delta_secs}s in the future (max allowed: {max_secs}s)")]
    TimestampTooFarInFuture {
        timestamp: u32,
        delta_secs: i64,
        max_secs: i64,
    },

    #[error("signature index {index} is out of range for {participants} participants")]
    SignatureIndexOutOfRange { index: u8, participants: usize },

    #[error("participant {index} signed more than once")]
    DuplicateSignatureIndex { index: u8 },

    #[error("signature of participant {index} is invalid")]
    InvalidMultiSignature { index: u8 },

    #[error("{valid} valid signatures, {required} required")]
    NotEnoughSignatures { required: usize, valid: usize },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies a signed transaction against `network`, using the core registry.
///
/// The checks, in order:
///
/// 1. **Network**: the header's network byte is `network`'s.
/// 2. **Schema**: the payload matches the declared type.
/// 3. **Timestamp**: at most 5 minutes in the future.
/// 4. **Signature**: present and valid for the sender's key.
/// 5. **Registrations**: a multi-signature registration must also carry a
///    valid signature from every participant it registers.
pub fn verify_transaction(tx: &Transaction, network: &NetworkConfig) -> Result<(), VerificationError> {
    verify_transaction_with(TransactionRegistry::core(), tx, network)
}

/// [`verify_transaction`] with an explicit registry, for plugin types and
/// non-default limits.
pub fn verify_transaction_with(
    registry: &TransactionRegistry,
    tx: &Transaction,
    network: &NetworkConfig,
) -> Result<(), VerificationError> {
    // 1. Network byte.
    if tx.network != network.pub_key_hash {
        return Err(VerificationError::NetworkMismatch {
            expected: network_name(network.pub_key_hash),
            actual: network_name(tx.network),
        });
    }

    // 2. Schema.
    registry.validate(tx)?;

    // 3. Timestamp must not be too far in the future.
    let delta_secs = (network.timestamp_to_datetime(tx.timestamp) - Utc::now()).num_seconds();
    if delta_secs > MAX_FUTURE_SECONDS {
        return Err(VerificationError::TimestampTooFarInFuture {
            timestamp: tx.timestamp,
            delta_secs,
            max_secs: MAX_FUTURE_SECONDS,
        });
    }

    // 4. Primary signature.
    let sender = tx
        .sender_public_key
        .as_ref()
        .ok_or(VerificationError::MissingSenderPublicKey)?;
    let signature = tx
        .signature
        .as_ref()
        .ok_or(VerificationError::MissingSignature)?;
    let hash = registry.signing_hash(tx, SerializeOptions::unsigned())?;
    if !verify_hash(sender, &hash, signature) {
        debug!(sender = %sender, "primary signature rejected");
        return Err(VerificationError::InvalidSignature {
            sender: sender.to_hex(),
        });
    }

    // 5. Everyone joining a multi-signature wallet must consent.
    if let Some(Asset::MultiSignature(registration)) = &tx.asset {
        let participants = registration.public_keys.len();
        check_indices(tx, participants)?;
        if tx.signatures.len() != participants {
            return Err(VerificationError::NotEnoughSignatures {
                required: participants,
                valid: tx.signatures.len(),
            });
        }
        verify_entries(tx, &registration.public_keys, &hash)?;
    }

    Ok(())
}

/// Verifies the second signature against the sender's registered second key.
pub fn verify_second_signature(
    tx: &Transaction,
    second_public_key: &PublicKey,
) -> Result<(), VerificationError> {
    verify_second_signature_with(TransactionRegistry::core(), tx, second_public_key)
}

/// [`verify_second_signature`] under `registry`'s types and limits.
pub fn verify_second_signature_with(
    registry: &TransactionRegistry,
    tx: &Transaction,
    second_public_key: &PublicKey,
) -> Result<(), VerificationError> {
    let second = tx
        .second_signature
        .as_ref()
        .ok_or(VerificationError::MissingSecondSignature)?;
    let hash = registry.signing_hash(tx, SerializeOptions::for_second_signature())?;
    if !verify_hash(second_public_key, &hash, second) {
        return Err(VerificationError::InvalidSecondSignature);
    }
    Ok(())
}

/// Verifies the participant signatures of a transaction sent from a
/// multi-signature wallet. At least `wallet.min` of them must be present,
/// and every one present must be valid.
pub fn verify_multi_signatures(
    tx: &Transaction,
    wallet: &MultiSignatureAsset,
) -> Result<(), VerificationError> {
    verify_multi_signatures_with(TransactionRegistry::core(), tx, wallet)
}

pub fn verify_multi_signatures_with(
    registry: &TransactionRegistry,
    tx: &Transaction,
    wallet: &MultiSignatureAsset,
) -> Result<(), VerificationError> {
    check_indices(tx, wallet.public_keys.len())?;

    let hash = registry.signing_hash(tx, SerializeOptions::unsigned())?;
    verify_entries(tx, &wallet.public_keys, &hash)?;

    let required = wallet.min as usize;
    if tx.signatures.len() < required {
        return Err(VerificationError::NotEnoughSignatures {
            required,
            valid: tx.signatures.len(),
        });
    }
    Ok(())
}

/// Every entry must verify. Indices were range-checked by the caller.
fn verify_entries(
    tx: &Transaction,
    public_keys: &[PublicKey],
    hash: &[u8; 32],
) -> Result<(), VerificationError> {
    for entry in &tx.signatures {
        if !verify_hash(&public_keys[entry.index as usize], hash, &entry.signature) {
            return Err(VerificationError::InvalidMultiSignature { index: entry.index });
        }
    }
    Ok(())
}

fn check_indices(tx: &Transaction, participants: usize) -> Result<(), VerificationError> {
    let mut seen = HashSet::with_capacity(tx.signatures.len());
    for entry in &tx.signatures {
        if entry.index as usize >= participants {
            return Err(VerificationError::SignatureIndexOutOfRange {
                index: entry.index,
                participants,
            });
        }
        if !seen.insert(entry.index) {
            return Err(VerificationError::DuplicateSignatureIndex { index: entry.index });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{Keypair, Signature};
    use crate::identity::Address;
    use crate::transaction::builder::{MultiSignatureEntry, TransactionBuilder};
    use crate::transaction::signing::{
        multi_sign_transaction, second_sign_transaction, sign_transaction,
    };
    use crate::transaction::types::TransferAsset;

    fn network() -> NetworkConfig {
        NetworkConfig::devnet()
    }

    fn transfer(amount: u64) -> Transaction {
        TransactionBuilder::new(Asset::Transfer(TransferAsset {
            amount,
            expiration: 0,
            recipient: Address::new(0x1E, [5u8; 20]),
        }))
        .network(&network())
        .nonce(1)
        .build()
        .unwrap()
    }

    fn signed_transfer(kp: &Keypair) -> Transaction {
        let mut tx = transfer(1_000);
        sign_transaction(&mut tx, kp).unwrap();
        tx
    }

    #[test]
    fn valid_transaction_passes() {
        let tx = signed_transfer(&Keypair::from_passphrase("alice"));
        verify_transaction(&tx, &network()).unwrap();
    }

    #[test]
    fn unsigned_rejected() {
        let mut tx = transfer(1);
        tx.sender_public_key = Some(Keypair::from_passphrase("alice").public_key());
        assert!(matches!(
            verify_transaction(&tx, &network()),
            Err(VerificationError::MissingSignature)
        ));
    }

    #[test]
    fn tampered_amount_rejected() {
        let mut tx = signed_transfer(&Keypair::from_passphrase("alice"));
        if let Some(Asset::Transfer(t)) = &mut tx.asset {
            t.amount += 1;
        }
        assert!(matches!(
            verify_transaction(&tx, &network()),
            Err(VerificationError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn wrong_signer_rejected() {
        let mut tx = signed_transfer(&Keypair::from_passphrase("alice"));
        tx.sender_public_key = Some(Keypair::from_passphrase("mallory").public_key());
        assert!(matches!(
            verify_transaction(&tx, &network()),
            Err(VerificationError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn wrong_network_rejected() {
        let tx = signed_transfer(&Keypair::from_passphrase("alice"));
        assert!(matches!(
            verify_transaction(&tx, &NetworkConfig::mainnet()),
            Err(VerificationError::NetworkMismatch { .. })
        ));
    }

    #[test]
    fn future_timestamp_rejected() {
        let kp = Keypair::from_passphrase("alice");
        let mut tx = transfer(1);
        tx.timestamp = network().timestamp_now() + 3_600;
        sign_transaction(&mut tx, &kp).unwrap();
        assert!(matches!(
            verify_transaction(&tx, &network()),
            Err(VerificationError::TimestampTooFarInFuture { .. })
        ));
    }

    #[test]
    fn slightly_future_timestamp_tolerated() {
        let kp = Keypair::from_passphrase("alice");
        let mut tx = transfer(1);
        tx.timestamp = network().timestamp_now() + 60;
        sign_transaction(&mut tx, &kp).unwrap();
        verify_transaction(&tx, &network()).unwrap();
    }

    #[test]
    fn schema_violation_surfaces_as_codec_error() {
        let mut tx = signed_transfer(&Keypair::from_passphrase("alice"));
        tx.vendor_field = Some(String::new());
        assert!(matches!(
            verify_transaction(&tx, &network()),
            Err(VerificationError::Codec(CodecError::InvalidTransaction { .. }))
        ));
    }

    #[test]
    fn second_signature_verification() {
        let kp = Keypair::from_passphrase("alice");
        let second = Keypair::from_passphrase("alice second");
        let mut tx = signed_transfer(&kp);
        assert!(matches!(
            verify_second_signature(&tx, &second.public_key()),
            Err(VerificationError::MissingSecondSignature)
        ));

        second_sign_transaction(&mut tx, &second).unwrap();
        verify_second_signature(&tx, &second.public_key()).unwrap();
        verify_transaction(&tx, &network()).unwrap();
        assert!(matches!(
            verify_second_signature(&tx, &kp.public_key()),
            Err(VerificationError::InvalidSecondSignature)
        ));
    }

    fn participants() -> Vec<Keypair> {
        (0..3)
            .map(|i| Keypair::from_passphrase(&format!("participant {}", i)))
            .collect()
    }

    fn wallet(min: u8, keys: &[Keypair]) -> MultiSignatureAsset {
        MultiSignatureAsset {
            min,
            public_keys: keys.iter().map(Keypair::public_key).collect(),
        }
    }

    #[test]
    fn multi_signature_threshold() {
        let keys = participants();
        let wallet = wallet(2, &keys);
        let mut tx = transfer(10);
        tx.sender_public_key = Some(Keypair::from_passphrase("wallet").public_key());

        multi_sign_transaction(&mut tx, &keys[0], 0).unwrap();
        assert!(matches!(
            verify_multi_signatures(&tx, &wallet),
            Err(VerificationError::NotEnoughSignatures { required: 2, valid: 1 })
        ));

        multi_sign_transaction(&mut tx, &keys[2], 2).unwrap();
        verify_multi_signatures(&tx, &wallet).unwrap();
    }

    #[test]
    fn multi_signature_wrong_signer_rejected() {
        let keys = participants();
        let wallet = wallet(1, &keys);
        let mut tx = transfer(10);
        tx.sender_public_key = Some(Keypair::from_passphrase("wallet").public_key());
        // Participant 1 signs in slot 0.
        multi_sign_transaction(&mut tx, &keys[1], 0).unwrap();
        assert!(matches!(
            verify_multi_signatures(&tx, &wallet),
            Err(VerificationError::InvalidMultiSignature { index: 0 })
        ));
    }

    #[test]
    fn multi_signature_index_out_of_range() {
        let keys = participants();
        let mut tx = transfer(10);
        tx.sender_public_key = Some(Keypair::from_passphrase("wallet").public_key());
        tx.signatures = vec![MultiSignatureEntry {
            index: 7,
            signature: Signature::from_bytes([0u8; 64]),
        }];
        assert!(matches!(
            verify_multi_signatures(&tx, &wallet(1, &keys)),
            Err(VerificationError::SignatureIndexOutOfRange { index: 7, participants: 3 })
        ));
    }

    #[test]
    fn multi_signature_registration_needs_everyone() {
        let sender = Keypair::from_passphrase("registrant");
        let keys = participants();
        let mut tx = TransactionBuilder::new(Asset::MultiSignature(wallet(2, &keys)))
            .network(&network())
            .nonce(1)
            .sender_public_key(sender.public_key())
            .build()
            .unwrap();

        multi_sign_transaction(&mut tx, &keys[0], 0).unwrap();
        multi_sign_transaction(&mut tx, &keys[1], 1).unwrap();
        sign_transaction(&mut tx, &sender).unwrap();
        assert!(matches!(
            verify_transaction(&tx, &network()),
            Err(VerificationError::NotEnoughSignatures { required: 3, valid: 2 })
        ));

        multi_sign_transaction(&mut tx, &keys[2], 2).unwrap();
        verify_transaction(&tx, &network()).unwrap();
    }
}
