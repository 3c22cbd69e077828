//! The in-memory transaction and its builder.
//!
//! [`Transaction`] mirrors the wire layout field for field, so the codec is
//! a straight walk over the struct and `decode(encode(tx)) == tx` is a
//! matter of not losing anything on the way.
//!
//! The builder does not sign -- that happens in [`super::signing`]. This
//! separation keeps construction testable without key material.

use serde::{Deserialize, Serialize};

use super::codec::CodecError;
use super::registry::TransactionRegistry;
use super::types::{Asset, InternalType, TransactionId, TransactionType};
use crate::config::{NetworkConfig, TRANSACTION_VERSION};
use crate::crypto::keys::{PublicKey, Signature};
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One participant's signature on a multi-signature transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignatureEntry {
    /// Position of the signer in the wallet's participant list.
    pub index: u8,
    pub signature: Signature,
}

/// A transaction of any registered type.
///
/// `type_group` and `type_id` say which schema `asset` must follow; the
/// registry enforces the match on every encode and decode. Signatures are
/// empty until [`super::signing`] fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Serialization version. Always 2 for transactions this crate writes.
    pub version: u8,

    /// Network byte. Stops a mainnet transaction being replayed on testnet.
    pub network: u8,

    pub type_group: u32,

    pub type_id: u16,

    /// Per-sender sequence number.
    pub nonce: u64,

    /// Seconds since the network epoch.
    pub timestamp: u32,

    /// `None` only on drafts that have not been signed yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_public_key: Option<PublicKey>,

    /// Fee in the smallest unit.
    pub fee: u64,

    /// Free-form memo, for the types that allow one. Never `Some("")`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_field: Option<String>,

    /// Type-specific payload. `None` only for payload-less types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_signature: Option<Signature>,

    /// Participant signatures, ascending by index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<MultiSignatureEntry>,
}

impl Transaction {
    pub fn internal_type(&self) -> InternalType {
        InternalType::new(self.type_group, self.type_id)
    }

    /// The built-in type, or `None` for plugin types.
    pub fn core_type(&self) -> Option<TransactionType> {
        self.internal_type().core_type()
    }

    /// Canonical bytes, using the core registry.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        TransactionRegistry::core().encode(self)
    }

    /// Parses canonical bytes, using the core registry.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        TransactionRegistry::core().decode(bytes)
    }

    /// `SHA-256(to_bytes())`. Changes whenever a signature is added.
    pub fn id(&self) -> Result<TransactionId, CodecError> {
        TransactionRegistry::core().transaction_id(self)
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn is_multi_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// The sender's address on this transaction's network.
    pub fn sender_address(&self) -> Option<Address> {
        self.sender_public_key
            .as_ref()
            .map(|pk| Address::from_public_key(pk, self.network))
    }

    /// Value leaving the sender's balance, excluding the fee.
    pub fn total_amount(&self) -> u64 {
        match &self.asset {
            Some(Asset::Transfer(transfer)) => transfer.amount,
            Some(Asset::HtlcLock(lock)) => lock.amount,
            Some(Asset::MultiPayment(payments)) => payments
                .iter()
                .fold(0u64, |total, p| total.saturating_add(p.amount)),
            _ => 0,
        }
    }

    /// Every address this transaction pays.
    pub fn recipients(&self) -> Vec<Address> {
        match &self.asset {
            Some(Asset::Transfer(transfer)) => vec![transfer.recipient],
            Some(Asset::HtlcLock(lock)) => vec![lock.recipient],
            Some(Asset::MultiPayment(payments)) => payments.iter().map(|p| p.recipient).collect(),
            _ => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`]s.
///
/// # Usage
///
/// ```rust,no_run
/// use txwire::config::NetworkConfig;
/// use txwire::identity::Address;
/// use txwire::transaction::{Asset, TransactionBuilder, TransferAsset};
///
/// let network = NetworkConfig::devnet();
/// let recipient: Address = "twd1...".parse().unwrap();
/// let tx = TransactionBuilder::new(Asset::Transfer(TransferAsset {
///     amount: 50_000_000,
///     expiration: 0,
///     recipient,
/// }))
/// .network(&network)
/// .nonce(1)
/// .vendor_field("thanks for lunch")
/// .build()
/// .unwrap();
/// ```
///
/// Defaults: version 2, the devnet network, the type's static fee, and a
/// timestamp of "now" on the chosen network's clock.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    version: u8,
    network: NetworkConfig,
    internal_type: Option<InternalType>,
    nonce: u64,
    timestamp: Option<u32>,
    sender_public_key: Option<PublicKey>,
    fee: Option<u64>,
    vendor_field: Option<String>,
    asset: Option<Asset>,
}

impl TransactionBuilder {
    fn with_parts(internal_type: Option<InternalType>, asset: Option<Asset>) -> Self {
        Self {
            version: TRANSACTION_VERSION,
            network: NetworkConfig::default(),
            internal_type,
            nonce: 0,
            timestamp: None,
            sender_public_key: None,
            fee: None,
            vendor_field: None,
            asset,
        }
    }

    /// A builder for a core transaction carrying `asset`. The type follows
    /// from the asset.
    pub fn new(asset: Asset) -> Self {
        let internal_type = asset.core_type().map(TransactionType::internal_type);
        Self::with_parts(internal_type, Some(asset))
    }

    /// A delegate resignation, the one core type without a payload.
    pub fn delegate_resignation() -> Self {
        Self::with_parts(
            Some(TransactionType::DelegateResignation.internal_type()),
            None,
        )
    }

    /// A plugin-type transaction with an opaque payload.
    pub fn custom(internal_type: InternalType, payload: Vec<u8>) -> Self {
        Self::with_parts(Some(internal_type), Some(Asset::Custom(payload)))
    }

    /// Only needed for testing version handling.
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Takes the network byte and the timestamp epoch from `config`.
    pub fn network(mut self, config: &NetworkConfig) -> Self {
        self.network = config.clone();
        self
    }

    /// Overrides just the network byte.
    pub fn network_byte(mut self, network: u8) -> Self {
        self.network.pub_key_hash = network;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Seconds since the network epoch.
    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn vendor_field(mut self, memo: impl Into<String>) -> Self {
        self.vendor_field = Some(memo.into());
        self
    }

    /// Usually left to [`super::signing::sign_transaction`]; set it here to
    /// build drafts for someone else to sign.
    pub fn sender_public_key(mut self, public_key: PublicKey) -> Self {
        self.sender_public_key = Some(public_key);
        self
    }

    /// Builds against the core registry.
    pub fn build(self) -> Result<Transaction, CodecError> {
        self.build_with(TransactionRegistry::core())
    }

    /// Builds and validates against `registry`, which must know the type.
    pub fn build_with(self, registry: &TransactionRegistry) -> Result<Transaction, CodecError> {
        let internal_type = self.internal_type.ok_or_else(|| {
            CodecError::invalid("custom payloads need an explicit type; use TransactionBuilder::custom")
        })?;
        let codec = registry.codec_for(internal_type)?;

        let fee = self
            .fee
            .unwrap_or_else(|| codec.static_fee(self.asset.as_ref()));
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| self.network.timestamp_now());

        let tx = Transaction {
            version: self.version,
            network: self.network.pub_key_hash,
            type_group: internal_type.group,
            type_id: internal_type.id,
            nonce: self.nonce,
            timestamp,
            sender_public_key: self.sender_public_key,
            fee,
            vendor_field: self.vendor_field,
            asset: self.asset,
            signature: None,
            second_signature: None,
            signatures: Vec::new(),
        };
        registry.validate(&tx)?;
        Ok(tx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
