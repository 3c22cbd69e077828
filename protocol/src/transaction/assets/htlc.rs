//! Hashed time-locked contracts: lock, claim, refund.
//!
//! A lock escrows `amount` for `recipient` until `expiration`. The recipient
//! claims by revealing the preimage of `secret_hash`; after expiration the
//! sender may refund instead. The codecs only care about shape. Whether a
//! claim's secret matches, or a refund is early, needs the lock transaction
//! and is checked against chain state elsewhere.

use bytes::{BufMut, BytesMut};

use super::asset_mismatch;
use crate::config::{ADDRESS_LENGTH, HASH_LENGTH};
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{
    Asset, HtlcClaimAsset, HtlcExpiration, HtlcLockAsset, HtlcRefundAsset, InternalType,
    TransactionType,
};
use crate::transaction::wire::{put_address, WireReader};

pub struct HtlcLockCodec;

impl AssetCodec for HtlcLockCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::HtlcLock.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::HtlcLock.name()
    }

    fn min_asset_length(&self) -> usize {
        8 + HASH_LENGTH + 1 + 4 + ADDRESS_LENGTH
    }

    fn supports_vendor_field(&self) -> bool {
        true
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        10_000_000
    }

    fn addon_bytes(&self) -> u64 {
        100
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        let Some(Asset::HtlcLock(lock)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        if lock.amount == 0 {
            return Err(CodecError::invalid("htlc lock amount must be positive"));
        }
        if lock.expiration.value() == 0 {
            return Err(CodecError::invalid("htlc lock expiration must be non-zero"));
        }
        Ok(())
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        let Some(Asset::HtlcLock(lock)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        buf.put_u64_le(lock.amount);
        buf.put_slice(&lock.secret_hash);
        buf.put_u8(lock.expiration.kind_byte());
        buf.put_u32_le(lock.expiration.value());
        put_address(buf, &lock.recipient);
        Ok(())
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let amount = reader.read_u64("htlc amount")?;
        let secret_hash = reader.read_array::<HASH_LENGTH>("htlc secret hash")?;
        let kind = reader.read_u8("htlc expiration kind")?;
        let value = reader.read_u32("htlc expiration")?;
        let expiration = HtlcExpiration::from_parts(kind, value).ok_or_else(|| {
            CodecError::malformed(format!("unknown htlc expiration kind {}", kind))
        })?;
        let recipient = reader.read_address("htlc recipient")?;
        Ok(Some(Asset::HtlcLock(HtlcLockAsset {
            amount,
            secret_hash,
            expiration,
            recipient,
        })))
    }
}

pub struct HtlcClaimCodec;

impl AssetCodec for HtlcClaimCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::HtlcClaim.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::HtlcClaim.name()
    }

    fn min_asset_length(&self) -> usize {
        2 * HASH_LENGTH
    }

    // Claims and refunds are free; the lock already paid.
    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        0
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        match asset {
            Some(Asset::HtlcClaim(_)) => Ok(()),
            other => Err(asset_mismatch(self.name(), other)),
        }
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        let Some(Asset::HtlcClaim(claim)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        buf.put_slice(claim.lock_transaction_id.as_bytes());
        buf.put_slice(&claim.unlock_secret);
        Ok(())
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let lock_transaction_id = reader.read_transaction_id("htlc lock id")?;
        let unlock_secret = reader.read_array::<HASH_LENGTH>("htlc unlock secret")?;
        Ok(Some(Asset::HtlcClaim(HtlcClaimAsset {
            lock_transaction_id,
            unlock_secret,
        })))
    }
}

pub struct HtlcRefundCodec;

impl AssetCodec for HtlcRefundCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::HtlcRefund.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::HtlcRefund.name()
    }

    fn min_asset_length(&self) -> usize {
        HASH_LENGTH
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        0
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        match asset {
            Some(Asset::HtlcRefund(_)) => Ok(()),
            other => Err(asset_mismatch(self.name(), other)),
        }
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        let Some(Asset::HtlcRefund(refund)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        buf.put_slice(refund.lock_transaction_id.as_bytes());
        Ok(())
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let lock_transaction_id = reader.read_transaction_id("htlc lock id")?;
        Ok(Some(Asset::HtlcRefund(HtlcRefundAsset {
            lock_transaction_id,
        })))
    }
}
