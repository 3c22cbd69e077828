use bytes::{BufMut, BytesMut};

use super::asset_mismatch;
use crate::config::ADDRESS_LENGTH;
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{Asset, InternalType, TransactionType, TransferAsset};
use crate::transaction::wire::{put_address, WireReader};

/// Single-recipient value transfer.
pub struct TransferCodec;

impl AssetCodec for TransferCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::Transfer.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::Transfer.name()
    }

    fn min_asset_length(&self) -> usize {
        8 + 4 + ADDRESS_LENGTH
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
        let Some(Asset::Transfer(transfer)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        if transfer.amount == 0 {
            return Err(CodecError::invalid("transfer amount must be positive"));
        }
        Ok(())
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        let Some(Asset::Transfer(transfer)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        buf.put_u64_le(transfer.amount);
        buf.put_u32_le(transfer.expiration);
        put_address(buf, &transfer.recipient);
        Ok(())
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let amount = reader.read_u64("transfer amount")?;
        let expiration = reader.read_u32("transfer expiration")?;
        let recipient = reader.read_address("transfer recipient")?;
        Ok(Some(Asset::Transfer(TransferAsset {
            amount,
            expiration,
            recipient,
        })))
    }
}
