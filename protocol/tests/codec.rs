//! Integration tests for the transaction codec.
//!
//! Each test builds real transactions through the public API, signs them,
//! pushes them through the wire format and back, and checks what comes out.
//! They cover every core type, the rejection of short or damaged inputs,
//! signature coverage, and plugin types registered at runtime.

use std::sync::Arc;

use txwire::config::{NetworkConfig, HEADER_LENGTH};
use txwire::crypto::keys::Keypair;
use txwire::crypto::sha256;
use txwire::identity::Address;
use txwire::transaction::assets::OpaqueCodec;
use txwire::transaction::fees::{dynamic_fee_with, network_dynamic_fee};
use txwire::transaction::signing::{
    multi_sign_transaction, multi_sign_transaction_with, second_sign_transaction,
    second_sign_transaction_with, sign_transaction, sign_transaction_with,
};
use txwire::transaction::verification::{
    verify_multi_signatures, verify_multi_signatures_with, verify_second_signature,
    verify_second_signature_with, verify_transaction, verify_transaction_with, VerificationError,
};
use txwire::transaction::{
    Asset, CodecError, DelegateRegistrationAsset, HtlcClaimAsset, HtlcExpiration, HtlcLockAsset,
    HtlcRefundAsset, InternalType, IpfsHash, MultiSignatureAsset, Payment, SecondSignatureAsset,
    Transaction, TransactionBuilder, TransactionId, TransactionRegistry, TransferAsset, Vote,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn devnet() -> NetworkConfig {
    NetworkConfig::devnet()
}

fn recipient(seed: u8) -> Address {
    Address::new(devnet().pub_key_hash, [seed; 20])
}

fn lock_id() -> TransactionId {
    TransactionId::from_bytes([0xAB; 32])
}

/// One builder per core type, with a vendor field wherever the type takes one.
fn core_builders() -> Vec<TransactionBuilder> {
    let delegate = Keypair::from_passphrase("delegate").public_key();
    let other = Keypair::from_passphrase("other delegate").public_key();
    let participants: Vec<_> = ["p0", "p1", "p2"]
        .iter()
        .map(|p| Keypair::from_passphrase(p).public_key())
        .collect();

    vec![
        TransactionBuilder::new(Asset::Transfer(TransferAsset {
            amount: 1_000,
            expiration: 0,
            recipient: recipient(1),
        }))
        .vendor_field("invoice 17"),
        TransactionBuilder::new(Asset::SecondSignature(SecondSignatureAsset {
            public_key: Keypair::from_passphrase("second").public_key(),
        })),
        TransactionBuilder::new(Asset::DelegateRegistration(DelegateRegistrationAsset {
            username: "genesis_1".to_string(),
        })),
        TransactionBuilder::new(Asset::Votes(vec![Vote::unvote(other), Vote::vote(delegate)])),
        TransactionBuilder::new(Asset::MultiSignature(MultiSignatureAsset {
            min: 2,
            public_keys: participants,
        })),
        TransactionBuilder::new(Asset::Ipfs(IpfsHash::from_digest(
            IpfsHash::SHA2_256,
            &[7u8; 32],
        ))),
        TransactionBuilder::new(Asset::MultiPayment(vec![
            Payment {
                amount: 10,
                recipient: recipient(2),
            },
            Payment {
                amount: 20,
                recipient: recipient(3),
            },
        ]))
        .vendor_field("payroll"),
        TransactionBuilder::delegate_resignation(),
        TransactionBuilder::new(Asset::HtlcLock(HtlcLockAsset {
            amount: 5_000,
            secret_hash: sha256(b"my secret"),
            expiration: HtlcExpiration::BlockHeight(9_000),
            recipient: recipient(4),
        }))
        .vendor_field("swap"),
        TransactionBuilder::new(Asset::HtlcClaim(HtlcClaimAsset {
            lock_transaction_id: lock_id(),
            unlock_secret: [3u8; 32],
        })),
        TransactionBuilder::new(Asset::HtlcRefund(HtlcRefundAsset {
            lock_transaction_id: lock_id(),
        })),
    ]
}

fn signed(builder: TransactionBuilder, keypair: &Keypair) -> Transaction {
    let mut tx = builder.nonce(3).timestamp(1_000).build().unwrap();
    sign_transaction(&mut tx, keypair).unwrap();
    tx
}

/// Like [`signed`], but multi-signature registrations also collect the
/// signatures of all their participants so that they verify.
fn fully_signed(builder: TransactionBuilder, keypair: &Keypair) -> Transaction {
    let mut tx = builder
        .nonce(3)
        .timestamp(1_000)
        .sender_public_key(keypair.public_key())
        .build()
        .unwrap();
    if let Some(Asset::MultiSignature(_)) = &tx.asset {
        for (i, p) in ["p0", "p1", "p2"].iter().enumerate() {
            multi_sign_transaction(&mut tx, &Keypair::from_passphrase(p), i as u8).unwrap();
        }
    }
    sign_transaction(&mut tx, keypair).unwrap();
    tx
}

fn min_length(registry: &TransactionRegistry, tx: &Transaction) -> usize {
    let vendor_field = tx.vendor_field.as_deref().map_or(0, str::len);
    let codec = registry.codec_for(tx.internal_type()).unwrap();
    HEADER_LENGTH + vendor_field + codec.min_asset_length()
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn every_core_type_survives_the_wire() {
    let sender = Keypair::from_passphrase("sender");
    let registry = TransactionRegistry::core();
    assert_eq!(core_builders().len(), registry.len());

    for builder in core_builders() {
        let tx = signed(builder, &sender);
        let bytes = txwire::encode(&tx).unwrap();
        let decoded = txwire::decode(&bytes).unwrap();

        assert_eq!(decoded, tx, "type {}", tx.internal_type());
        assert_eq!(txwire::encode(&decoded).unwrap(), bytes);
    }
}

#[test]
fn unsigned_transactions_survive_the_wire() {
    let sender = Keypair::from_passphrase("sender").public_key();
    for builder in core_builders() {
        let tx = builder.sender_public_key(sender).nonce(1).timestamp(5).build().unwrap();
        let bytes = txwire::encode(&tx).unwrap();
        assert_eq!(txwire::decode(&bytes).unwrap(), tx);
    }
}

#[test]
fn json_and_wire_agree() {
    let sender = Keypair::from_passphrase("sender");
    for builder in core_builders() {
        let tx = signed(builder, &sender);
        let json = serde_json::to_string(&tx).unwrap();
        let from_json: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(from_json, tx);
        assert_eq!(txwire::encode(&from_json).unwrap(), txwire::encode(&tx).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Rejection of short and damaged input
// ---------------------------------------------------------------------------

#[test]
fn inputs_shorter_than_the_schema_are_malformed() {
    let sender = Keypair::from_passphrase("sender");
    let registry = TransactionRegistry::core();

    for builder in core_builders() {
        let tx = signed(builder, &sender);
        let bytes = txwire::encode(&tx).unwrap();
        let min = min_length(registry, &tx);
        assert!(min <= bytes.len());

        for len in 0..min {
            match txwire::decode(&bytes[..len]) {
                Err(CodecError::MalformedPayload { .. }) => {}
                other => panic!(
                    "type {} truncated to {} of {} bytes gave {:?}",
                    tx.internal_type(),
                    len,
                    bytes.len(),
                    other
                ),
            }
        }
    }
}

#[test]
fn every_truncation_is_handled_without_panicking() {
    let sender = Keypair::from_passphrase("sender");
    for builder in core_builders() {
        let mut tx = signed(builder, &sender);
        second_sign_transaction(&mut tx, &Keypair::from_passphrase("second")).unwrap();
        let bytes = txwire::encode(&tx).unwrap();

        for len in 0..bytes.len() {
            if let Ok(decoded) = txwire::decode(&bytes[..len]) {
                // A prefix can only parse if it drops whole signature blocks.
                assert!(decoded.second_signature.is_none());
                assert_eq!(decoded.asset, tx.asset);
            }
        }
    }
}

#[test]
fn trailing_bytes_are_rejected() {
    let tx = signed(core_builders().remove(0), &Keypair::from_passphrase("sender"));
    let mut bytes = txwire::encode(&tx).unwrap();
    bytes.extend_from_slice(&[0u8; 7]);
    assert!(matches!(
        txwire::decode(&bytes),
        Err(CodecError::MalformedPayload { .. })
    ));
}

#[test]
fn unknown_types_are_reported_as_such() {
    let tx = signed(core_builders().remove(0), &Keypair::from_passphrase("sender"));
    let mut bytes = txwire::encode(&tx).unwrap();
    // Type id lives at offset 7..9.
    bytes[7] = 0x63;
    match txwire::decode(&bytes) {
        Err(CodecError::UnknownType { internal_type }) => {
            assert_eq!(internal_type, InternalType::new(1, 0x63));
        }
        other => panic!("expected UnknownType, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

#[test]
fn signed_transactions_verify_and_tampering_is_caught() {
    let sender = Keypair::from_passphrase("sender");
    for builder in core_builders() {
        let tx = fully_signed(builder, &sender);
        verify_transaction(&tx, &devnet()).unwrap();

        let mut bytes = txwire::encode(&tx).unwrap();
        // First fee byte: still decodes, no longer verifies.
        bytes[53] ^= 0x01;
        let tampered = txwire::decode(&bytes).unwrap();
        assert!(matches!(
            verify_transaction(&tampered, &devnet()),
            Err(VerificationError::InvalidSignature { .. })
        ));
    }
}

#[test]
fn second_signature_flow() {
    let sender = Keypair::from_passphrase("sender");
    let second = Keypair::from_passphrase("second");
    let mut tx = signed(core_builders().remove(0), &sender);
    second_sign_transaction(&mut tx, &second).unwrap();

    let decoded = txwire::decode(&txwire::encode(&tx).unwrap()).unwrap();
    verify_transaction(&decoded, &devnet()).unwrap();
    verify_second_signature(&decoded, &second.public_key()).unwrap();
    assert!(matches!(
        verify_second_signature(&decoded, &sender.public_key()),
        Err(VerificationError::InvalidSecondSignature)
    ));
}

#[test]
fn multi_signature_registration_needs_every_participant() {
    let participants: Vec<Keypair> = ["p0", "p1", "p2"]
        .iter()
        .map(|p| Keypair::from_passphrase(p))
        .collect();
    let asset = MultiSignatureAsset {
        min: 2,
        public_keys: participants.iter().map(Keypair::public_key).collect(),
    };
    let sender = Keypair::from_passphrase("sender");
    let mut tx = TransactionBuilder::new(Asset::MultiSignature(asset))
        .nonce(1)
        .timestamp(1)
        .sender_public_key(sender.public_key())
        .build()
        .unwrap();

    for (i, kp) in participants.iter().enumerate().take(2) {
        multi_sign_transaction(&mut tx, kp, i as u8).unwrap();
    }
    sign_transaction(&mut tx, &sender).unwrap();
    assert!(matches!(
        verify_transaction(&tx, &devnet()),
        Err(VerificationError::NotEnoughSignatures { required: 3, valid: 2 })
    ));

    multi_sign_transaction(&mut tx, &participants[2], 2).unwrap();
    sign_transaction(&mut tx, &sender).unwrap();
    let decoded = txwire::decode(&txwire::encode(&tx).unwrap()).unwrap();
    assert_eq!(decoded.signatures.len(), 3);
    verify_transaction(&decoded, &devnet()).unwrap();
}

#[test]
fn spending_from_a_multi_signature_wallet() {
    let participants: Vec<Keypair> = ["a", "b", "c"]
        .iter()
        .map(|p| Keypair::from_passphrase(p))
        .collect();
    let wallet = MultiSignatureAsset {
        min: 2,
        public_keys: participants.iter().map(Keypair::public_key).collect(),
    };
    let wallet_key = Keypair::from_passphrase("wallet").public_key();
    let mut tx = core_builders()
        .remove(0)
        .sender_public_key(wallet_key)
        .nonce(4)
        .timestamp(1)
        .build()
        .unwrap();

    multi_sign_transaction(&mut tx, &participants[2], 2).unwrap();
    assert!(matches!(
        verify_multi_signatures(&tx, &wallet),
        Err(VerificationError::NotEnoughSignatures { required: 2, valid: 1 })
    ));

    multi_sign_transaction(&mut tx, &participants[0], 0).unwrap();
    let decoded = txwire::decode(&txwire::encode(&tx).unwrap()).unwrap();
    assert!(decoded.signature.is_none());
    verify_multi_signatures(&decoded, &wallet).unwrap();

    // A signature from the wrong participant at a valid index.
    multi_sign_transaction(&mut tx, &participants[0], 1).unwrap();
    assert!(matches!(
        verify_multi_signatures(&tx, &wallet),
        Err(VerificationError::InvalidMultiSignature { index: 1 })
    ));
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[test]
fn id_is_the_hash_of_the_full_serialization() {
    let sender = Keypair::from_passphrase("sender");
    let mut tx = signed(core_builders().remove(0), &sender);
    let bytes = txwire::encode(&tx).unwrap();
    assert_eq!(tx.id().unwrap(), TransactionId::of_serialized(&bytes));
    assert_eq!(tx.id().unwrap().as_bytes(), &sha256(&bytes));

    let before = tx.id().unwrap();
    second_sign_transaction(&mut tx, &Keypair::from_passphrase("second")).unwrap();
    assert_ne!(tx.id().unwrap(), before);
}

// ---------------------------------------------------------------------------
// Plugin types
// ---------------------------------------------------------------------------

#[test]
fn plugin_types_round_trip_through_their_registry() {
    let plugin_type = InternalType::new(1001, 0);
    let mut registry = TransactionRegistry::for_network(&devnet());
    registry
        .register(Arc::new(OpaqueCodec::new(plugin_type, "business_registration", 50_000_000)))
        .unwrap();

    let sender = Keypair::from_passphrase("business");
    let mut tx = TransactionBuilder::custom(plugin_type, b"acme corp".to_vec())
        .nonce(1)
        .timestamp(1)
        .build_with(&registry)
        .unwrap();
    assert_eq!(tx.fee, 50_000_000);
    txwire::transaction::signing::sign_transaction_with(&registry, &mut tx, &sender).unwrap();

    let bytes = registry.encode(&tx).unwrap();
    assert_eq!(registry.decode(&bytes).unwrap(), tx);

    // The core registry has never heard of it.
    assert!(matches!(
        txwire::decode(&bytes),
        Err(CodecError::UnknownType { .. })
    ));

    // Once removed, the plugin registry forgets it too.
    registry.deregister(plugin_type).unwrap();
    assert!(matches!(
        registry.decode(&bytes),
        Err(CodecError::UnknownType { .. })
    ));
}

#[test]
fn network_limits_flow_into_the_codec() {
    let mut config = devnet();
    config.max_vendor_field_length = 4;
    let registry = TransactionRegistry::for_network(&config);

    let tx = signed(core_builders().remove(0), &Keypair::from_passphrase("sender"));
    let bytes = txwire::encode(&tx).unwrap();
    assert!(matches!(
        registry.encode(&tx),
        Err(CodecError::InvalidTransaction { .. })
    ));
    assert!(matches!(
        registry.decode(&bytes),
        Err(CodecError::MalformedPayload { .. })
    ));
}

#[test]
fn network_registry_carries_through_fees_and_signature_checks() {
    let mut network = devnet();
    network.multi_payment_limit = 100;
    let registry = TransactionRegistry::for_network(&network);

    let payments = (0..80u8)
        .map(|i| Payment {
            amount: 1 + i as u64,
            recipient: recipient(i),
        })
        .collect();
    let sender = Keypair::from_passphrase("payroll");
    let second = Keypair::from_passphrase("payroll second");
    let mut tx = TransactionBuilder::new(Asset::MultiPayment(payments))
        .network(&network)
        .nonce(1)
        .timestamp(1_000)
        .build_with(&registry)
        .unwrap();
    sign_transaction_with(&registry, &mut tx, &sender).unwrap();
    second_sign_transaction_with(&registry, &mut tx, &second).unwrap();

    // The default limits know nothing of this network.
    assert!(matches!(
        txwire::encode(&tx),
        Err(CodecError::InvalidTransaction { .. })
    ));

    verify_transaction_with(&registry, &tx, &network).unwrap();
    verify_second_signature_with(&registry, &tx, &second.public_key()).unwrap();
    assert_eq!(
        network_dynamic_fee(&tx, &network).unwrap(),
        dynamic_fee_with(&registry, &tx, network.fee_multiplier).unwrap()
    );

    // The same wallet sending through participants.
    let participants: Vec<Keypair> = ["x", "y"].iter().map(|p| Keypair::from_passphrase(p)).collect();
    let wallet = MultiSignatureAsset {
        min: 2,
        public_keys: participants.iter().map(Keypair::public_key).collect(),
    };
    tx.signature = None;
    tx.second_signature = None;
    for (i, kp) in participants.iter().enumerate() {
        multi_sign_transaction_with(&registry, &mut tx, kp, i as u8).unwrap();
    }
    verify_multi_signatures_with(&registry, &tx, &wallet).unwrap();
}
