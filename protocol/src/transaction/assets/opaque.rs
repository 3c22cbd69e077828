use bytes::{BufMut, BytesMut};

use crate::config::MAX_TRANSACTION_SIZE;
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{Asset, InternalType};
use crate::transaction::wire::WireReader;

/// Carries a plugin type's payload as length-prefixed bytes.
///
/// Enough for a plugin that validates its payload somewhere else, and for
/// tooling that has to pass unknown types through untouched. Plugins with a
/// real schema implement [`AssetCodec`] themselves.
#[derive(Debug, Clone)]
pub struct OpaqueCodec {
    internal_type: InternalType,
    name: String,
    static_fee: u64,
}

impl OpaqueCodec {
    pub fn new(internal_type: InternalType, name: impl Into<String>, static_fee: u64) -> Self {
        Self {
            internal_type,
            name: name.into(),
            static_fee,
        }
    }
}

impl AssetCodec for OpaqueCodec {
    fn internal_type(&self) -> InternalType {
        self.internal_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn min_asset_length(&self) -> usize {
        4
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        self.static_fee
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        match asset {
            Some(Asset::Custom(bytes)) if bytes.len() <= MAX_TRANSACTION_SIZE => Ok(()),
            Some(Asset::Custom(bytes)) => Err(CodecError::invalid(format!(
                "{} payload of {} bytes is too large",
                self.name,
                bytes.len()
            ))),
            other => Err(CodecError::invalid(format!(
                "{} transaction expects a custom asset, got {}",
                self.name,
                other.map_or("none", Asset::kind_name)
            ))),
        }
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        let Some(Asset::Custom(bytes)) = asset else {
            return Err(CodecError::invalid(format!("{} expects a custom asset", self.name)));
        };
        buf.put_u32_le(bytes.len() as u32);
        buf.put_slice(bytes);
        Ok(())
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let len = reader.read_u32("custom payload length")? as usize;
        let bytes = reader.read_slice(len, "custom payload")?;
        Ok(Some(Asset::Custom(bytes.to_vec())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::assets::test_support::{decode_bytes, roundtrip};

    fn codec() -> OpaqueCodec {
        OpaqueCodec::new(InternalType::new(1_001, 0), "nft_mint", 25)
    }

    #[test]
    fn roundtrip_custom_bytes() {
        let asset = Asset::Custom(b"token #42".to_vec());
        assert_eq!(roundtrip(&codec(), Some(asset.clone())), Some(asset));
        assert_eq!(roundtrip(&codec(), Some(Asset::Custom(vec![]))), Some(Asset::Custom(vec![])));
    }

    #[test]
    fn core_assets_rejected() {
        let err = codec().validate(Some(&Asset::Votes(vec![])), &CodecLimits::default());
        assert!(matches!(err, Err(CodecError::InvalidTransaction { .. })));
    }

    #[test]
    fn declared_length_past_end_is_malformed() {
        let mut bytes = 100u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"short");
        assert!(matches!(
            decode_bytes(&codec(), &bytes),
            Err(CodecError::MalformedPayload { .. })
        ));
    }
}
