use bytes::{BufMut, BytesMut};

use super::asset_mismatch;
use crate::config::MAX_IPFS_DIGEST_LENGTH;
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{Asset, InternalType, IpfsHash, TransactionType};
use crate::transaction::wire::WireReader;

/// Anchors an IPFS multihash. The multihash is self-delimiting, so it goes
/// on the wire as is.
pub struct IpfsCodec;

impl AssetCodec for IpfsCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::Ipfs.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::Ipfs.name()
    }

    fn min_asset_length(&self) -> usize {
        3
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        500_000_000
    }

    fn addon_bytes(&self) -> u64 {
        250
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        let Some(Asset::Ipfs(hash)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        let bytes = hash.as_bytes();
        if bytes.len() < 2 {
            return Err(CodecError::invalid("ipfs multihash is missing its header"));
        }
        let declared = bytes[1] as usize;
        let digest = hash.digest();
        if declared != digest.len() {
            return Err(CodecError::invalid(format!(
                "ipfs multihash declares a {} byte digest but carries {}",
                declared,
                digest.len()
            )));
        }
        if digest.is_empty() || digest.len() > MAX_IPFS_DIGEST_LENGTH {
            return Err(CodecError::invalid(format!(
                "ipfs digest must be 1 to {} bytes, got {}",
                MAX_IPFS_DIGEST_LENGTH,
                digest.len()
            )));
        }
        Ok(())
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        match asset {
            Some(Asset::Ipfs(hash)) => {
                buf.put_slice(hash.as_bytes());
                Ok(())
            }
            other => Err(asset_mismatch(self.name(), other)),
        }
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let code = reader.read_u8("ipfs hash function")?;
        let len = reader.read_u8("ipfs digest length")? as usize;
        if len == 0 || len > MAX_IPFS_DIGEST_LENGTH {
            return Err(CodecError::malformed(format!(
                "ipfs digest length {} out of range",
                len
            )));
        }
        let digest = reader.read_slice(len, "ipfs digest")?;
        Ok(Some(Asset::Ipfs(IpfsHash::from_digest(code, digest))))
    }
}
