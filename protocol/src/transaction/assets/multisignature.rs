use std::collections::HashSet;

use bytes::{BufMut, BytesMut};

use super::asset_mismatch;
use crate::config::{MAX_MULTI_SIGNATURE_KEYS, PUBLIC_KEY_LENGTH};
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{Asset, InternalType, MultiSignatureAsset, TransactionType};
use crate::transaction::wire::{put_public_key, WireReader};

const MULTI_SIGNATURE_FEE_PER_KEY: u64 = 500_000_000;

/// Registration of an m-of-n multi-signature wallet.
pub struct MultiSignatureCodec;

impl AssetCodec for MultiSignatureCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::MultiSignature.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::MultiSignature.name()
    }

    fn min_asset_length(&self) -> usize {
        2 + PUBLIC_KEY_LENGTH
    }

    /// One fee unit per participant plus one for the registration itself.
    fn static_fee(&self, asset: Option<&Asset>) -> u64 {
        let keys = match asset {
            Some(Asset::MultiSignature(multi)) => multi.public_keys.len() as u64,
            _ => 0,
        };
        MULTI_SIGNATURE_FEE_PER_KEY * (keys + 1)
    }

    fn addon_bytes(&self) -> u64 {
        500
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        let Some(Asset::MultiSignature(multi)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        let count = multi.public_keys.len();
        if count == 0 || count > MAX_MULTI_SIGNATURE_KEYS {
            return Err(CodecError::invalid(format!(
                "multi-signature needs 1 to {} participants, got {}",
                MAX_MULTI_SIGNATURE_KEYS, count
            )));
        }
        if multi.min == 0 || multi.min as usize > count {
            return Err(CodecError::invalid(format!(
                "minimum of {} signatures is impossible with {} participants",
                multi.min, count
            )));
        }
        let mut seen = HashSet::with_capacity(count);
        if !multi.public_keys.iter().all(|key| seen.insert(key)) {
            return Err(CodecError::invalid("duplicate multi-signature participant"));
        }
        Ok(())
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        let Some(Asset::MultiSignature(multi)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        buf.put_u8(multi.min);
        buf.put_u8(multi.public_keys.len() as u8);
        for key in &multi.public_keys {
            put_public_key(buf, key);
        }
        Ok(())
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let min = reader.read_u8("multi-signature minimum")?;
        let count = reader.read_u8("multi-signature key count")? as usize;
        if count == 0 || count > MAX_MULTI_SIGNATURE_KEYS {
            return Err(CodecError::malformed(format!(
                "multi-signature key count {} out of range",
                count
            )));
        }
        reader.ensure(count * PUBLIC_KEY_LENGTH, "multi-signature keys")?;

        let public_keys = (0..count)
            .map(|_| reader.read_public_key("multi-signature key"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Asset::MultiSignature(MultiSignatureAsset { min, public_keys })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{Keypair, PublicKey};
    use crate::transaction::assets::test_support::{is_invalid, roundtrip};

    fn keys(n: usize) -> Vec<PublicKey> {
        (0..n)
            .map(|i| Keypair::from_passphrase(&format!("participant {}", i)).public_key())
            .collect()
    }

    fn asset(min: u8, public_keys: Vec<PublicKey>) -> Asset {
        Asset::MultiSignature(MultiSignatureAsset { min, public_keys })
    }

    #[test]
    fn roundtrip_two_of_three() {
        let a = asset(2, keys(3));
        assert_eq!(roundtrip(&MultiSignatureCodec, Some(a.clone())), Some(a));
    }

    #[test]
    fn fee_scales_with_participants() {
        assert_eq!(MultiSignatureCodec.static_fee(Some(&asset(2, keys(3)))), 2_000_000_000);
    }

    #[test]
    fn schema_violations() {
        let limits = CodecLimits::default();
        assert!(is_invalid(MultiSignatureCodec.validate(Some(&asset(0, keys(2))), &limits)));
        assert!(is_invalid(MultiSignatureCodec.validate(Some(&asset(3, keys(2))), &limits)));
        assert!(is_invalid(MultiSignatureCodec.validate(Some(&asset(1, vec![])), &limits)));
        assert!(is_invalid(MultiSignatureCodec.validate(Some(&asset(1, keys(17))), &limits)));

        let mut dup = keys(2);
        dup.push(dup[0]);
        assert!(is_invalid(MultiSignatureCodec.validate(Some(&asset(2, dup)), &limits)));
    }
}
