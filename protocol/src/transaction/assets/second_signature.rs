use bytes::BytesMut;

use super::asset_mismatch;
use crate::config::PUBLIC_KEY_LENGTH;
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{Asset, InternalType, SecondSignatureAsset, TransactionType};
use crate::transaction::wire::{put_public_key, WireReader};

/// Registers a second key whose signature is required on every later
/// transaction from the sender.
pub struct SecondSignatureCodec;

impl AssetCodec for SecondSignatureCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::SecondSignature.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::SecondSignature.name()
    }

    fn min_asset_length(&self) -> usize {
        PUBLIC_KEY_LENGTH
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        500_000_000
    }

    fn addon_bytes(&self) -> u64 {
        250
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        let Some(Asset::SecondSignature(second)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        if !second.public_key.is_valid_point() {
            return Err(CodecError::invalid("second public key is not a valid Ed25519 point"));
        }
        Ok(())
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        match asset {
            Some(Asset::SecondSignature(second)) => {
                put_public_key(buf, &second.public_key);
                Ok(())
            }
            other => Err(asset_mismatch(self.name(), other)),
        }
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let public_key = reader.read_public_key("second public key")?;
        Ok(Some(Asset::SecondSignature(SecondSignatureAsset { public_key })))
    }
}
