//! Transaction signing with Ed25519 keypairs.
//!
//! Signing is a separate step from building because the keypair may not
//! be available at construction time (e.g., hardware wallet, remote signer).
//!
//! What each signature covers:
//!
//! | signature        | message                                               |
//! |------------------|-------------------------------------------------------|
//! | primary          | `SHA-256(serialize(tx, no signatures))`               |
//! | second           | `SHA-256(serialize(tx, primary signature only))`      |
//! | participant *i*  | `SHA-256(serialize(tx, no signatures))`, same as primary |
//!
//! Participants sign the same digest as the sender so that they can sign in
//! any order, independently of each other.

use super::builder::{MultiSignatureEntry, Transaction};
use super::codec::{CodecError, SerializeOptions};
use super::registry::TransactionRegistry;
use crate::crypto::keys::Keypair;
use crate::crypto::signatures::sign_hash;

/// Signs a transaction in place as its sender.
///
/// Sets `sender_public_key` to the keypair's key and stores the primary
/// signature. Any second signature is dropped: it signed the old primary
/// signature and would no longer verify. Participant signatures are kept
/// only when the sender key is unchanged, since they cover the sender key
/// but not the primary signature.
///
/// # Example
///
/// ```rust,no_run
/// use txwire::crypto::keys::Keypair;
/// use txwire::transaction::{sign_transaction, TransactionBuilder};
///
/// let keypair = Keypair::generate();
/// let mut tx = TransactionBuilder::delegate_resignation().nonce(1).build().unwrap();
///
/// sign_transaction(&mut tx, &keypair).unwrap();
/// assert!(tx.is_signed());
/// ```
pub fn sign_transaction<'a>(
    tx: &'a mut Transaction,
    keypair: &Keypair,
) -> Result<&'a Transaction, CodecError> {
    sign_transaction_with(TransactionRegistry::core(), tx, keypair)
}

/// [`sign_transaction`] for transactions of plugin types.
pub fn sign_transaction_with<'a>(
    registry: &TransactionRegistry,
    tx: &'a mut Transaction,
    keypair: &Keypair,
) -> Result<&'a Transaction, CodecError> {
    let sender = keypair.public_key();
    if tx.sender_public_key != Some(sender) {
        tx.signatures.clear();
    }
    tx.sender_public_key = Some(sender);
    tx.second_signature = None;
    let hash = registry.signing_hash(tx, SerializeOptions::unsigned())?;
    tx.signature = Some(sign_hash(keypair, &hash));
    Ok(tx)
}

/// Adds the second signature of a sender that registered a second key.
/// The transaction must already carry its primary signature.
pub fn second_sign_transaction<'a>(
    tx: &'a mut Transaction,
    second_keypair: &Keypair,
) -> Result<&'a Transaction, CodecError> {
    second_sign_transaction_with(TransactionRegistry::core(), tx, second_keypair)
}

pub fn second_sign_transaction_with<'a>(
    registry: &TransactionRegistry,
    tx: &'a mut Transaction,
    second_keypair: &Keypair,
) -> Result<&'a Transaction, CodecError> {
    if tx.signature.is_none() {
        return Err(CodecError::invalid(
            "second signature requires a primary signature first",
        ));
    }
    let hash = registry.signing_hash(tx, SerializeOptions::for_second_signature())?;
    tx.second_signature = Some(sign_hash(second_keypair, &hash));
    Ok(tx)
}

/// Adds (or replaces) the signature of the participant at `index`.
///
/// Entries are kept sorted by index, which is the only order the codec
/// accepts.
pub fn multi_sign_transaction<'a>(
    tx: &'a mut Transaction,
    keypair: &Keypair,
    index: u8,
) -> Result<&'a Transaction, CodecError> {
    multi_sign_transaction_with(TransactionRegistry::core(), tx, keypair, index)
}

pub fn multi_sign_transaction_with<'a>(
    registry: &TransactionRegistry,
    tx: &'a mut Transaction,
    keypair: &Keypair,
    index: u8,
) -> Result<&'a Transaction, CodecError> {
    let hash = registry.signing_hash(tx, SerializeOptions::unsigned())?;
    let entry = MultiSignatureEntry {
        index,
        signature: sign_hash(keypair, &hash),
    };
    match tx.signatures.binary_search_by_key(&index, |e| e.index) {
        Ok(pos) => tx.signatures[pos] = entry,
        Err(pos) => tx.signatures.insert(pos, entry),
    }
    Ok(tx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
