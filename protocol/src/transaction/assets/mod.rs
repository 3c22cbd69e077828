//! Per-type payload codecs.
//!
//! One [`AssetCodec`] per core transaction type, plus [`OpaqueCodec`] for
//! plugins that only need their payload carried around as bytes. Layouts
//! use the same little-endian primitives as the header (see
//! [`super::wire`]).
//!
//! | type                  | layout                                             | min |
//! |-----------------------|----------------------------------------------------|-----|
//! | transfer              | amount u64, expiration u32, recipient [21]         | 33  |
//! | second_signature      | public_key [32]                                    | 32  |
//! | delegate_registration | len u8, username                                   | 2   |
//! | vote                  | count u8, (action u8, public_key [32])*            | 34  |
//! | multi_signature       | min u8, count u8, public_key [32]*                 | 34  |
//! | ipfs                  | code u8, len u8, digest                            | 3   |
//! | multi_payment         | count u16, (amount u64, recipient [21])*           | 60  |
//! | delegate_resignation  | nothing                                            | 0   |
//! | htlc_lock             | amount u64, hash [32], kind u8, value u32, recipient [21] | 66 |
//! | htlc_claim            | lock_id [32], secret [32]                          | 64  |
//! | htlc_refund           | lock_id [32]                                       | 32  |

use std::sync::Arc;

use super::codec::CodecError;
use super::registry::AssetCodec;
use super::types::Asset;

mod delegate;
mod htlc;
mod ipfs;
mod multipayment;
mod multisignature;
mod opaque;
mod second_signature;
mod transfer;
mod vote;

pub use delegate::{DelegateRegistrationCodec, DelegateResignationCodec};
pub use htlc::{HtlcClaimCodec, HtlcLockCodec, HtlcRefundCodec};
pub use ipfs::IpfsCodec;
pub use multipayment::MultiPaymentCodec;
pub use multisignature::MultiSignatureCodec;
pub use opaque::OpaqueCodec;
pub use second_signature::SecondSignatureCodec;
pub use transfer::TransferCodec;
pub use vote::VoteCodec;

/// One codec for every core transaction type.
pub fn core_codecs() -> Vec<Arc<dyn AssetCodec>> {
    vec![
        Arc::new(TransferCodec),
        Arc::new(SecondSignatureCodec),
        Arc::new(DelegateRegistrationCodec),
        Arc::new(VoteCodec),
        Arc::new(MultiSignatureCodec),
        Arc::new(IpfsCodec),
        Arc::new(MultiPaymentCodec),
        Arc::new(DelegateResignationCodec),
        Arc::new(HtlcLockCodec),
        Arc::new(HtlcClaimCodec),
        Arc::new(HtlcRefundCodec),
    ]
}

/// The error for an asset of the wrong kind (or a missing one).
pub(crate) fn asset_mismatch(expected: &str, got: Option<&Asset>) -> CodecError {
    CodecError::invalid(format!(
        "{} transaction expects a {} asset, got {}",
        expected,
        expected,
        got.map_or("none", Asset::kind_name)
    ))
}
