//! # Transaction Codec
//!
//! Converts between [`Transaction`] and its canonical byte form.
//!
//! ## Wire Layout
//!
//! ```text
//! header (62 bytes, little-endian integers)
//!   0xFF marker | version u8 | network u8 | type_group u32 | type u16
//!   nonce u64 | timestamp u32 | sender_public_key [32] | fee u64
//!   vendor_field_length u8
//! vendor_field   [vendor_field_length]   UTF-8
//! asset          type-specific, see super::assets
//! signature          [64]   optional
//! second_signature   [64]   optional
//! multi signatures   (index u8 || signature [64])*
//! ```
//!
//! The signature section has no length prefixes. With `R` bytes left after
//! the asset: `R == 0` means unsigned, `R % 65 == 0` means participant
//! signatures only, otherwise a primary signature is present and, if what
//! remains still isn't a multiple of 65, a second signature follows it.
//!
//! ## Error Discipline
//!
//! - [`CodecError::MalformedPayload`]: the bytes are not a transaction.
//!   Every decoding failure is reported this way, including schema
//!   violations in otherwise well-formed bytes.
//! - [`CodecError::InvalidTransaction`]: a `Transaction` value that may not
//!   be encoded. Encoding validates first and never writes a partial result.
//! - [`CodecError::UnknownType`]: no codec is registered for the type.
//!
//! Both directions run the same schema check, which is what makes
//! `decode(encode(tx)) == tx` hold for every encodable `tx`.

use bytes::{BufMut, BytesMut};
use thiserror::Error;
use tracing::{debug, trace};

use super::builder::{MultiSignatureEntry, Transaction};
use super::registry::TransactionRegistry;
use super::types::{InternalType, TransactionId};
use super::wire::{put_public_key, put_signature, WireReader};
use crate::config::{
    HEADER_LENGTH, MAX_TRANSACTION_SIZE, MULTI_SIGNATURE_ENTRY_LENGTH, TRANSACTION_HEADER_MARKER,
    TRANSACTION_VERSION,
};
use crate::crypto::hash::sha256;
use crate::crypto::keys::Signature;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input bytes are truncated, inconsistent, or violate a type schema.
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    /// The transaction value cannot be serialized.
    #[error("invalid transaction: {reason}")]
    InvalidTransaction { reason: String },

    /// The header names a type nobody registered.
    #[error("unknown transaction type {internal_type}")]
    UnknownType { internal_type: InternalType },
}

impl CodecError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTransaction {
            reason: reason.into(),
        }
    }

    /// Re-labels a schema violation found while decoding. Bytes that decode
    /// into an invalid value were malformed bytes all along.
    pub fn into_malformed(self) -> Self {
        match self {
            Self::InvalidTransaction { reason } => Self::MalformedPayload { reason },
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Serialize options
// ---------------------------------------------------------------------------

/// Which signature fields to include when serializing.
///
/// Signing hashes are computed over partial serializations: the primary
/// signature covers everything but signatures, the second signature also
/// covers the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    pub include_signature: bool,
    pub include_second_signature: bool,
    pub include_multi_signatures: bool,
}

impl SerializeOptions {
    /// The full canonical form. Transaction IDs hash this.
    pub const fn full() -> Self {
        Self {
            include_signature: true,
            include_second_signature: true,
            include_multi_signatures: true,
        }
    }

    /// No signatures at all. Primary and participant signatures sign this.
    pub const fn unsigned() -> Self {
        Self {
            include_signature: false,
            include_second_signature: false,
            include_multi_signatures: false,
        }
    }

    /// Everything up to and including the primary signature.
    pub const fn for_second_signature() -> Self {
        Self {
            include_signature: true,
            include_second_signature: false,
            include_multi_signatures: false,
        }
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self::full()
    }
}

// ---------------------------------------------------------------------------
// Encoding / decoding
// ---------------------------------------------------------------------------

impl TransactionRegistry {
    /// Checks a transaction against the header rules and its type's schema.
    ///
    /// A missing sender key is allowed here so that unsigned drafts can be
    /// validated; [`encode`](Self::encode) refuses them.
    pub fn validate(&self, tx: &Transaction) -> Result<(), CodecError> {
        if tx.version != TRANSACTION_VERSION {
            return Err(CodecError::invalid(format!(
                "unsupported version {} (expected {})",
                tx.version, TRANSACTION_VERSION
            )));
        }

        let codec = self.codec_for(tx.internal_type())?;

        if let Some(vendor_field) = &tx.vendor_field {
            if !codec.supports_vendor_field() {
                return Err(CodecError::invalid(format!(
                    "{} transactions cannot carry a vendor field",
                    codec.name()
                )));
            }
            if vendor_field.is_empty() {
                return Err(CodecError::invalid("vendor field is empty; use None instead"));
            }
            let max = self.limits().max_vendor_field_length.min(u8::MAX as usize);
            if vendor_field.len() > max {
                return Err(CodecError::invalid(format!(
                    "vendor field is {} bytes, limit is {}",
                    vendor_field.len(),
                    max
                )));
            }
        }

        codec.validate(tx.asset.as_ref(), self.limits())?;

        if tx.second_signature.is_some() && tx.signature.is_none() {
            return Err(CodecError::invalid(
                "second signature present without a primary signature",
            ));
        }

        // Strictly ascending indices: unique, and one canonical byte order.
        for pair in tx.signatures.windows(2) {
            if pair[0].index >= pair[1].index {
                return Err(CodecError::invalid(format!(
                    "multi-signature indices must be strictly ascending, got {} then {}",
                    pair[0].index, pair[1].index
                )));
            }
        }

        Ok(())
    }

    /// Serializes a transaction in full.
    pub fn encode(&self, tx: &Transaction) -> Result<Vec<u8>, CodecError> {
        self.encode_with(tx, SerializeOptions::full())
    }

    /// Serializes a transaction, including only the signature fields
    /// `options` asks for.
    pub fn encode_with(
        &self,
        tx: &Transaction,
        options: SerializeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        self.validate(tx)?;
        let codec = self.codec_for(tx.internal_type())?;
        let sender = tx
            .sender_public_key
            .as_ref()
            .ok_or_else(|| CodecError::invalid("missing sender public key"))?;

        let vendor_field = tx.vendor_field.as_deref().unwrap_or_default();
        let mut buf = BytesMut::with_capacity(HEADER_LENGTH + vendor_field.len() + 128);

        buf.put_u8(TRANSACTION_HEADER_MARKER);
        buf.put_u8(tx.version);
        buf.put_u8(tx.network);
        buf.put_u32_le(tx.type_group);
        buf.put_u16_le(tx.type_id);
        buf.put_u64_le(tx.nonce);
        buf.put_u32_le(tx.timestamp);
        put_public_key(&mut buf, sender);
        buf.put_u64_le(tx.fee);
        buf.put_u8(vendor_field.len() as u8);
        buf.put_slice(vendor_field.as_bytes());
        debug_assert_eq!(buf.len(), HEADER_LENGTH + vendor_field.len());

        codec.encode_asset(tx.asset.as_ref(), &mut buf)?;

        if options.include_signature {
            if let Some(signature) = &tx.signature {
                put_signature(&mut buf, signature);
            }
        }
        if options.include_second_signature {
            if let Some(signature) = &tx.second_signature {
                put_signature(&mut buf, signature);
            }
        }
        if options.include_multi_signatures {
            for entry in &tx.signatures {
                buf.put_u8(entry.index);
                put_signature(&mut buf, &entry.signature);
            }
        }

        if buf.len() > MAX_TRANSACTION_SIZE {
            return Err(CodecError::invalid(format!(
                "serialized size {} exceeds the {} byte limit",
                buf.len(),
                MAX_TRANSACTION_SIZE
            )));
        }

        trace!(
            internal_type = %tx.internal_type(),
            len = buf.len(),
            "encoded transaction"
        );
        Ok(buf.to_vec())
    }

    /// Parses a transaction from its canonical byte form.
    pub fn decode(&self, bytes: &[u8]) -> Result<Transaction, CodecError> {
        let result = self.decode_inner(bytes);
        if let Err(err) = &result {
            debug!(len = bytes.len(), error = %err, "rejected transaction bytes");
        }
        result
    }

    fn decode_inner(&self, bytes: &[u8]) -> Result<Transaction, CodecError> {
        if bytes.len() < HEADER_LENGTH {
            return Err(CodecError::malformed(format!(
                "{} bytes is shorter than the {} byte header",
                bytes.len(),
                HEADER_LENGTH
            )));
        }
        if bytes.len() > MAX_TRANSACTION_SIZE {
            return Err(CodecError::malformed(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                MAX_TRANSACTION_SIZE
            )));
        }

        let mut reader = WireReader::new(bytes);

        let marker = reader.read_u8("header marker")?;
        if marker != TRANSACTION_HEADER_MARKER {
            return Err(CodecError::malformed(format!(
                "bad header marker 0x{:02x}",
                marker
            )));
        }
        let version = reader.read_u8("version")?;
        if version != TRANSACTION_VERSION {
            return Err(CodecError::malformed(format!(
                "unsupported version {}",
                version
            )));
        }
        let network = reader.read_u8("network")?;
        let type_group = reader.read_u32("type group")?;
        let type_id = reader.read_u16("type")?;
        let internal_type = InternalType::new(type_group, type_id);
        let codec = self.codec_for(internal_type)?;

        let nonce = reader.read_u64("nonce")?;
        let timestamp = reader.read_u32("timestamp")?;
        let sender_public_key = reader.read_public_key("sender public key")?;
        let fee = reader.read_u64("fee")?;

        let vendor_field_length = reader.read_u8("vendor field length")? as usize;
        let vendor_field = if vendor_field_length == 0 {
            None
        } else {
            if !codec.supports_vendor_field() {
                return Err(CodecError::malformed(format!(
                    "{} transactions cannot carry a vendor field",
                    codec.name()
                )));
            }
            let raw = reader.read_slice(vendor_field_length, "vendor field")?;
            let s = std::str::from_utf8(raw)
                .map_err(|_| CodecError::malformed("vendor field is not valid UTF-8"))?;
            Some(s.to_owned())
        };

        let min = codec.min_asset_length();
        if reader.remaining() < min {
            return Err(CodecError::malformed(format!(
                "{} payload needs at least {} bytes, {} left",
                codec.name(),
                min,
                reader.remaining()
            )));
        }
        let asset = codec.decode_asset(&mut reader)?;

        let (signature, second_signature, signatures) = read_signatures(&mut reader)?;

        let tx = Transaction {
            version,
            network,
            type_group,
            type_id,
            nonce,
            timestamp,
            sender_public_key: Some(sender_public_key),
            fee,
            vendor_field,
            asset,
            signature,
            second_signature,
            signatures,
        };
        self.validate(&tx).map_err(CodecError::into_malformed)?;

        trace!(internal_type = %internal_type, len = bytes.len(), "decoded transaction");
        Ok(tx)
    }

    /// SHA-256 of the full serialization.
    pub fn transaction_id(&self, tx: &Transaction) -> Result<TransactionId, CodecError> {
        Ok(TransactionId::of_serialized(&self.encode(tx)?))
    }

    /// The 32-byte digest a signer signs for the given partial serialization.
    pub fn signing_hash(
        &self,
        tx: &Transaction,
        options: SerializeOptions,
    ) -> Result<[u8; 32], CodecError> {
        Ok(sha256(&self.encode_with(tx, options)?))
    }
}

type SignatureSection = (Option<Signature>, Option<Signature>, Vec<MultiSignatureEntry>);

fn read_signatures(reader: &mut WireReader<'_>) -> Result<SignatureSection, CodecError> {
    let mut signature = None;
    let mut second_signature = None;

    if reader.remaining() % MULTI_SIGNATURE_ENTRY_LENGTH != 0 {
        signature = Some(reader.read_signature("signature")?);
        if reader.remaining() % MULTI_SIGNATURE_ENTRY_LENGTH != 0 {
            second_signature = Some(reader.read_signature("second signature")?);
        }
    }

    if reader.remaining() % MULTI_SIGNATURE_ENTRY_LENGTH != 0 {
        return Err(CodecError::malformed(format!(
            "{} trailing bytes after signatures",
            reader.remaining()
        )));
    }

    let mut signatures = Vec::with_capacity(reader.remaining() / MULTI_SIGNATURE_ENTRY_LENGTH);
    while reader.remaining() > 0 {
        let index = reader.read_u8("multi-signature index")?;
        let signature = reader.read_signature("multi-signature")?;
        signatures.push(MultiSignatureEntry { index, signature });
    }

    Ok((signature, second_signature, signatures))
}

// ---------------------------------------------------------------------------
// Free functions over the core registry
// ---------------------------------------------------------------------------

/// Serializes `tx` with the core registry.
pub fn encode(tx: &Transaction) -> Result<Vec<u8>, CodecError> {
    TransactionRegistry::core().encode(tx)
}

/// Parses bytes with the core registry.
pub fn decode(bytes: &[u8]) -> Result<Transaction, CodecError> {
    TransactionRegistry::core().decode(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
