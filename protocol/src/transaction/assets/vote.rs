use bytes::{BufMut, BytesMut};

use super::asset_mismatch;
use crate::config::{MAX_VOTES, PUBLIC_KEY_LENGTH};
use crate::transaction::codec::CodecError;
use crate::transaction::registry::{AssetCodec, CodecLimits};
use crate::transaction::types::{Asset, InternalType, TransactionType, Vote, VoteAction};
use crate::transaction::wire::{put_public_key, WireReader};

const VOTE_ENTRY_LENGTH: usize = 1 + PUBLIC_KEY_LENGTH;

/// Votes and unvotes.
///
/// A transaction holds one entry, or exactly two when switching delegates:
/// an unvote for the old one followed by a vote for the new one.
pub struct VoteCodec;

impl AssetCodec for VoteCodec {
    fn internal_type(&self) -> InternalType {
        TransactionType::Vote.internal_type()
    }

    fn name(&self) -> &str {
        TransactionType::Vote.name()
    }

    fn min_asset_length(&self) -> usize {
        1 + VOTE_ENTRY_LENGTH
    }

    fn static_fee(&self, _asset: Option<&Asset>) -> u64 {
        100_000_000
    }

    fn addon_bytes(&self) -> u64 {
        100
    }

    fn validate(&self, asset: Option<&Asset>, _limits: &CodecLimits) -> Result<(), CodecError> {
        let Some(Asset::Votes(votes)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        match votes.as_slice() {
            [] => Err(CodecError::invalid("vote transaction has no votes")),
            [_] => Ok(()),
            [first, second] => {
                if first.action != VoteAction::Unvote || second.action != VoteAction::Vote {
                    return Err(CodecError::invalid(
                        "two votes must be an unvote followed by a vote",
                    ));
                }
                if first.delegate == second.delegate {
                    return Err(CodecError::invalid("cannot unvote and vote the same delegate"));
                }
                Ok(())
            }
            _ => Err(CodecError::invalid(format!(
                "{} votes, at most {} allowed",
                votes.len(),
                MAX_VOTES
            ))),
        }
    }

    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError> {
        let Some(Asset::Votes(votes)) = asset else {
            return Err(asset_mismatch(self.name(), asset));
        };
        buf.put_u8(votes.len() as u8);
        for vote in votes {
            buf.put_u8(vote.action.to_byte());
            put_public_key(buf, &vote.delegate);
        }
        Ok(())
    }

    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError> {
        let count = reader.read_u8("vote count")? as usize;
        if count == 0 || count > MAX_VOTES {
            return Err(CodecError::malformed(format!("vote count {} out of range", count)));
        }
        reader.ensure(count * VOTE_ENTRY_LENGTH, "votes")?;

        let mut votes = Vec::with_capacity(count);
        for _ in 0..count {
            let marker = reader.read_u8("vote action")?;
            let action = VoteAction::from_byte(marker)
                .ok_or_else(|| CodecError::malformed(format!("unknown vote action {}", marker)))?;
            let delegate = reader.read_public_key("vote delegate")?;
            votes.push(Vote { action, delegate });
        }
        Ok(Some(Asset::Votes(votes)))
    }
}
