//! # Transaction Module
//!
//! The transaction type registry and the wire codec, plus what it takes to
//! produce and check a transaction: building, signing, verifying, fees.
//!
//! ## Architecture
//!
//! ```text
//! types.rs       : TransactionType, InternalType, TransactionId, Asset payloads
//! registry.rs    : AssetCodec trait and the TransactionRegistry of codecs
//! codec.rs       : encode/decode of the header and signature section
//! wire.rs        : bounds-checked little-endian read/write primitives
//! assets/        : one AssetCodec per core type, plus an opaque plugin codec
//! builder.rs     : Transaction and the fluent TransactionBuilder
//! signing.rs     : primary, second and multi-signature signing
//! verification.rs: network, schema, timestamp and signature checks
//! fees.rs        : static fee table and the dynamic fee formula
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] assembles and schema-checks a draft.
//! 2. **Sign**: [`sign_transaction`] with the sender's keypair.
//! 3. **Encode**: [`encode`] produces the canonical bytes for broadcast.
//! 4. **Decode**: peers run [`decode`], which rejects anything malformed.
//! 5. **Verify**: [`verify_transaction`] before accepting it.
//!
//! ## Design Decisions
//!
//! - Transaction IDs are SHA-256 of the complete serialization, signatures
//!   included. An ID is only final once the transaction is fully signed.
//! - All amounts are `u64` in the smallest denomination. No floating point
//!   anywhere near monetary values.
//! - Encoding and decoding share one schema check, so anything that encodes
//!   decodes back to an equal value.
//! - Timestamps are checked against a 5-minute future window to tolerate
//!   clock skew without accepting post-dated transactions.

pub mod assets;
pub mod builder;
pub mod codec;
pub mod fees;
pub mod registry;
pub mod signing;
pub mod types;
pub mod verification;
pub mod wire;

pub use builder::{MultiSignatureEntry, Transaction, TransactionBuilder};
pub use codec::{decode, encode, CodecError, SerializeOptions};
pub use fees::{dynamic_fee, static_fee};
pub use registry::{AssetCodec, CodecLimits, RegistryError, TransactionRegistry};
pub use signing::{multi_sign_transaction, second_sign_transaction, sign_transaction};
pub use types::{
    Asset, DelegateRegistrationAsset, HtlcClaimAsset, HtlcExpiration, HtlcLockAsset,
    HtlcRefundAsset, InternalType, IpfsHash, MultiSignatureAsset, Payment, SecondSignatureAsset,
    TransactionId, TransactionType, TransferAsset, Vote, VoteAction,
};
pub use verification::{
    verify_multi_signatures, verify_multi_signatures_with, verify_second_signature,
    verify_second_signature_with, verify_transaction, verify_transaction_with, VerificationError,
};
