//! Core type definitions for transactions.
//!
//! These types form the vocabulary of the codec: which kinds of transaction
//! exist, how they are identified on the wire, and what each payload (the
//! "asset") contains. They are plain data; the byte layouts live in
//! [`super::assets`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{HASH_LENGTH, TYPE_GROUP_CORE};
use crate::crypto::hash::sha256;
use crate::crypto::keys::PublicKey;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// The built-in transaction types of the core type group.
///
/// The discriminant is the type id written on the wire. Plugins define
/// their own types in other groups and never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum TransactionType {
    /// Move value from the sender to one recipient.
    Transfer = 0,
    /// Register a second public key whose signature is required from now on.
    SecondSignature = 1,
    /// Register the sender as a delegate under a username.
    DelegateRegistration = 2,
    /// Vote for, or withdraw a vote from, a delegate.
    Vote = 3,
    /// Turn the sender into an m-of-n multi-signature wallet.
    MultiSignature = 4,
    /// Anchor an IPFS content hash on chain.
    Ipfs = 5,
    /// Pay several recipients in one transaction.
    MultiPayment = 6,
    /// Retire a delegate registration.
    DelegateResignation = 7,
    /// Lock funds behind a hash and a deadline.
    HtlcLock = 8,
    /// Claim locked funds by revealing the secret.
    HtlcClaim = 9,
    /// Return locked funds to the sender after the deadline.
    HtlcRefund = 10,
}

impl TransactionType {
    /// Every core type, in wire-id order.
    pub const ALL: [TransactionType; 11] = [
        Self::Transfer,
        Self::SecondSignature,
        Self::DelegateRegistration,
        Self::Vote,
        Self::MultiSignature,
        Self::Ipfs,
        Self::MultiPayment,
        Self::DelegateResignation,
        Self::HtlcLock,
        Self::HtlcClaim,
        Self::HtlcRefund,
    ];

    /// The type id written on the wire.
    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn internal_type(self) -> InternalType {
        InternalType::new(TYPE_GROUP_CORE, self.id())
    }

    /// Stable snake_case name, used in logs, JSON and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::SecondSignature => "second_signature",
            Self::DelegateRegistration => "delegate_registration",
            Self::Vote => "vote",
            Self::MultiSignature => "multi_signature",
            Self::Ipfs => "ipfs",
            Self::MultiPayment => "multi_payment",
            Self::DelegateResignation => "delegate_resignation",
            Self::HtlcLock => "htlc_lock",
            Self::HtlcClaim => "htlc_claim",
            Self::HtlcRefund => "htlc_refund",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// InternalType
// ---------------------------------------------------------------------------

/// The `(type group, type id)` pair that identifies a transaction's schema
/// on the wire. This is the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InternalType {
    pub group: u32,
    pub id: u16,
}

impl InternalType {
    pub const fn new(group: u32, id: u16) -> Self {
        Self { group, id }
    }

    pub fn is_core(&self) -> bool {
        self.group == TYPE_GROUP_CORE
    }

    /// The built-in type this identifies, if any.
    pub fn core_type(&self) -> Option<TransactionType> {
        if self.is_core() {
            TransactionType::from_id(self.id)
        } else {
            None
        }
    }
}

impl From<TransactionType> for InternalType {
    fn from(t: TransactionType) -> Self {
        t.internal_type()
    }
}

impl fmt::Display for InternalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.id)
    }
}

// ---------------------------------------------------------------------------
// TransactionId
// ---------------------------------------------------------------------------

/// SHA-256 of a fully serialized transaction (signatures included).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId([u8; HASH_LENGTH]);

impl TransactionId {
    pub fn from_bytes(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Hashes a serialized transaction.
    pub fn of_serialized(bytes: &[u8]) -> Self {
        Self(sha256(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for TransactionId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; HASH_LENGTH];
        hex::decode_to_slice(s.trim(), &mut out)?;
        Ok(Self(out))
    }
}

impl TryFrom<String> for TransactionId {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.to_hex()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Asset payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAsset {
    /// Amount in the smallest unit.
    pub amount: u64,
    /// Block height after which the transfer may no longer be forged.
    /// Zero means "never expires".
    #[serde(default)]
    pub expiration: u32,
    pub recipient: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondSignatureAsset {
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateRegistrationAsset {
    pub username: String,
}

/// Direction of a vote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteAction {
    Vote,
    Unvote,
}

impl VoteAction {
    /// Wire marker: 1 for vote, 0 for unvote.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Vote => 1,
            Self::Unvote => 0,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Vote),
            0 => Some(Self::Unvote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vote {
    pub action: VoteAction,
    pub delegate: PublicKey,
}

impl Vote {
    pub fn vote(delegate: PublicKey) -> Self {
        Self {
            action: VoteAction::Vote,
            delegate,
        }
    }

    pub fn unvote(delegate: PublicKey) -> Self {
        Self {
            action: VoteAction::Unvote,
            delegate,
        }
    }
}

/// Registration of an m-of-n signature group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignatureAsset {
    /// Signatures required (`m`).
    pub min: u8,
    /// Participant keys (`n`). A participant's index is its position here.
    pub public_keys: Vec<PublicKey>,
}

/// A raw IPFS multihash: `code || digest_len || digest`.
///
/// Serialized as the familiar base58 string (`Qm...` for sha2-256).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpfsHash(Vec<u8>);

impl IpfsHash {
    /// Multihash code for sha2-256, which is what `Qm...` CIDs use.
    pub const SHA2_256: u8 = 0x12;

    /// Wraps raw multihash bytes without validating them. The codec checks
    /// the structure when encoding.
    pub fn from_multihash(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_digest(code: u8, digest: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(2 + digest.len());
        bytes.push(code);
        bytes.push(digest.len() as u8);
        bytes.extend_from_slice(digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn code(&self) -> Option<u8> {
        self.0.first().copied()
    }

    pub fn digest(&self) -> &[u8] {
        self.0.get(2..).unwrap_or_default()
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl FromStr for IpfsHash {
    type Err = bs58::decode::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(bs58::decode(s.trim()).into_vec()?))
    }
}

impl TryFrom<String> for IpfsHash {
    type Error = bs58::decode::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IpfsHash> for String {
    fn from(hash: IpfsHash) -> Self {
        hash.to_base58()
    }
}

impl fmt::Display for IpfsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for IpfsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IpfsHash({})", self.to_base58())
    }
}

/// One leg of a multipayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: u64,
    pub recipient: Address,
}

/// When an HTLC lock may be refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum HtlcExpiration {
    /// Seconds since the network epoch.
    EpochTimestamp(u32),
    /// Absolute block height.
    BlockHeight(u32),
}

impl HtlcExpiration {
    /// Wire marker: 1 for epoch timestamp, 2 for block height.
    pub fn kind_byte(&self) -> u8 {
        match self {
            Self::EpochTimestamp(_) => 1,
            Self::BlockHeight(_) => 2,
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            Self::EpochTimestamp(v) | Self::BlockHeight(v) => *v,
        }
    }

    pub fn from_parts(kind: u8, value: u32) -> Option<Self> {
        match kind {
            1 => Some(Self::EpochTimestamp(value)),
            2 => Some(Self::BlockHeight(value)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcLockAsset {
    pub amount: u64,
    /// `SHA-256(secret)`; whoever reveals `secret` can claim.
    #[serde(with = "hex::serde")]
    pub secret_hash: [u8; HASH_LENGTH],
    pub expiration: HtlcExpiration,
    pub recipient: Address,
}

impl HtlcLockAsset {
    /// Returns `true` if `secret` unlocks this HTLC.
    pub fn matches_secret(&self, secret: &[u8; HASH_LENGTH]) -> bool {
        sha256(secret) == self.secret_hash
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcClaimAsset {
    pub lock_transaction_id: TransactionId,
    #[serde(with = "hex::serde")]
    pub unlock_secret: [u8; HASH_LENGTH],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcRefundAsset {
    pub lock_transaction_id: TransactionId,
}

/// The type-specific payload of a transaction.
///
/// Delegate resignations carry no payload and are represented by the
/// absence of an asset, not by a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    Transfer(TransferAsset),
    SecondSignature(SecondSignatureAsset),
    DelegateRegistration(DelegateRegistrationAsset),
    Votes(Vec<Vote>),
    MultiSignature(MultiSignatureAsset),
    Ipfs(IpfsHash),
    MultiPayment(Vec<Payment>),
    HtlcLock(HtlcLockAsset),
    HtlcClaim(HtlcClaimAsset),
    HtlcRefund(HtlcRefundAsset),
    /// Opaque bytes for plugin-defined types.
    Custom(#[serde(with = "hex::serde")] Vec<u8>),
}

impl Asset {
    /// The core type this payload belongs to. `None` for custom payloads.
    pub fn core_type(&self) -> Option<TransactionType> {
        Some(match self {
            Self::Transfer(_) => TransactionType::Transfer,
            Self::SecondSignature(_) => TransactionType::SecondSignature,
            Self::DelegateRegistration(_) => TransactionType::DelegateRegistration,
            Self::Votes(_) => TransactionType::Vote,
            Self::MultiSignature(_) => TransactionType::MultiSignature,
            Self::Ipfs(_) => TransactionType::Ipfs,
            Self::MultiPayment(_) => TransactionType::MultiPayment,
            Self::HtlcLock(_) => TransactionType::HtlcLock,
            Self::HtlcClaim(_) => TransactionType::HtlcClaim,
            Self::HtlcRefund(_) => TransactionType::HtlcRefund,
            Self::Custom(_) => return None,
        })
    }

    /// Short name for error messages.
    pub fn kind_name(&self) -> &'static str {
        self.core_type().map_or("custom", TransactionType::name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
