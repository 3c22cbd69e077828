//! Delegate registration and resignation.

use bytes::BytesMut;

use super::asset_mismatch;
use crate::config::{MAX_USERNAME_LENGTH, USERNAME_SPECIAL_CHARS};
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{Asset, DelegateRegistrationAsset, InternalType, TransactionType};
use crate::transaction::wire::{put_short_string, WireReader};

const DELEGATE_FEE: u64 = 2_500_000_000;
const DELEGATE_ADDON_BYTES: u64 = 400_000;

/// Returns `true` if `username` is a legal delegate name: 1 to 20 characters
/// drawn from lowercase ASCII letters, digits and `!@$&_.`.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LENGTH
        && username.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || USERNAME_SPECIAL_CHARS.contains(c)
        })
}

pub struct DelegateRegistrationCodec;

impl AssetCodec for DelegateRegistrationCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::DelegateRegistration.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::DelegateRegistration.name()
    }

    fn min_asset_length(&self) -> usize {
        2
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        DELEGATE_FEE
    }

    fn addon_bytes(&self) -> u64 {
        DELEGATE_ADDON_BYTES
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        let Some(Asset::DelegateRegistration(registration)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        if !is_valid_username(&registration.username) {
            return Err(CodecError::invalid(format!(
                "invalid delegate username {:?}",
                registration.username
            )));
        }
        Ok(())
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        match asset {
            Some(Asset::DelegateRegistration(registration)) => {
                put_short_string(buf, &registration.username);
                Ok(())
            }
            other => Err(asset_mismatch(self.name(), other)),
        }
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let username = reader.read_short_string("delegate username")?;
        Ok(Some(Asset::DelegateRegistration(DelegateRegistrationAsset { username })))
    }
}

/// Resignation carries no payload: the sender is the delegate.
pub struct DelegateResignationCodec;

impl AssetCodec for DelegateResignationCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::DelegateResignation.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::DelegateResignation.name()
    }

    fn min_asset_length(&self) -> usize {
        0
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        DELEGATE_FEE
    }

    fn addon_bytes(&self) -> u64 {
        DELEGATE_ADDON_BYTES
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        match asset {
            None => Ok(()),
            Some(other) => Err(CodecError::invalid(format!(
                "delegate_resignation carries no asset, got {}",
                other.kind_name()
            ))),
        }
    }

    fn encode_asset(&self, _asset: Option<&Asset>, _buf: &mut BytesMut) -> Result<(), CodecError> {
        Ok(())
    }

    fn decode_asset(&self, _reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        Ok(None)
    }
}
