//! Transaction fees.
//!
//! Two schemes, and the network decides which one it enforces:
//!
//! - **Static**: a fixed price per type (multi-signature registrations
//!   also pay per participant). See [`static_fee`].
//! - **Dynamic**: pay per serialized byte, plus a per-type surcharge
//!   expressed in "addon bytes" so that expensive-to-process types cost
//!   more than their size alone would suggest:
//!
//!   ```text
//!   fee = (addon_bytes(type) + serialized_len) * fee_multiplier
//!   ```
//!
//! All amounts are in the smallest unit (10^8 per coin).

use super::builder::Transaction;
use super::codec::CodecError;
use super::registry::TransactionRegistry;
use super::types::InternalType;
use crate::config::NetworkConfig;

/// The fixed fee for `tx`'s type and payload.
pub fn static_fee(tx: &Transaction) -> Result<u64, CodecError> {
    static_fee_with(TransactionRegistry::core(), tx)
}

pub fn static_fee_with(registry: &TransactionRegistry, tx: &Transaction) -> Result<u64, CodecError> {
    let codec = registry.codec_for(tx.internal_type())?;
    Ok(codec.static_fee(tx.asset.as_ref()))
}

/// The dynamic-fee surcharge for a type registered in `registry`.
pub fn addon_bytes(
    registry: &TransactionRegistry,
    internal_type: InternalType,
) -> Result<u64, CodecError> {
    Ok(registry.codec_for(internal_type)?.addon_bytes())
}

/// The minimum fee under the dynamic scheme at `fee_multiplier`.
///
/// Sized on the full serialization, signatures included, so compute it for
/// the transaction as it will be broadcast. Saturates rather than overflows.
pub fn dynamic_fee(tx: &Transaction, fee_multiplier: u64) -> Result<u64, CodecError> {
    dynamic_fee_with(TransactionRegistry::core(), tx, fee_multiplier)
}

pub fn dynamic_fee_with(
    registry: &TransactionRegistry,
    tx: &Transaction,
    fee_multiplier: u64,
) -> Result<u64, CodecError> {
    let addon = addon_bytes(registry, tx.internal_type())?;
    let size = registry.encode(tx)?.len() as u64;
    Ok(addon.saturating_add(size).saturating_mul(fee_multiplier))
}

/// [`dynamic_fee`] with the network's configured multiplier and limits.
pub fn network_dynamic_fee(tx: &Transaction, network: &NetworkConfig) -> Result<u64, CodecError> {
    let registry = TransactionRegistry::for_network(network);
    dynamic_fee_with(&registry, tx, network.fee_multiplier)
}
