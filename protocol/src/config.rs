//! # Protocol Configuration & Constants
//!
//! Every magic number in the wire format lives here. If you're hardcoding a
//! byte offset somewhere else, you're doing it wrong and you owe the team
//! coffee.
//!
//! Two kinds of things live in this module:
//!
//! - **Constants**: header layout, key and signature sizes, schema limits.
//!   Changing any of these changes the bytes on the wire, which is a hard
//!   fork by another name.
//! - **[`NetworkConfig`]**: the per-network knobs (address prefix, epoch,
//!   vendor field size, multipayment limit, fee multiplier). Presets exist for
//!   mainnet, testnet and devnet; anything else can be loaded from TOML.

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Wire Format
// ---------------------------------------------------------------------------

/// First byte of every serialized transaction. Lets a decoder reject random
/// garbage before it gets as far as looking up a type.
pub const TRANSACTION_HEADER_MARKER: u8 = 0xFF;

/// Serialization version produced by this crate. Version 1 (timestamp-only,
/// no nonce, no type groups) is not supported.
pub const TRANSACTION_VERSION: u8 = 2;

/// Fixed header length in bytes, up to and including the vendor field
/// length byte:
///
/// ```text
/// marker(1) version(1) network(1) type_group(4) type(2) nonce(8)
/// timestamp(4) sender_public_key(32) fee(8) vendor_field_len(1)  = 62
/// ```
pub const HEADER_LENGTH: usize = 62;

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// A multi-signature entry on the wire: participant index + signature.
pub const MULTI_SIGNATURE_ENTRY_LENGTH: usize = 1 + SIGNATURE_LENGTH;

/// Length of the key hash inside an address.
pub const ADDRESS_HASH_LENGTH: usize = 20;

/// Serialized address length: network byte + key hash.
pub const ADDRESS_LENGTH: usize = 1 + ADDRESS_HASH_LENGTH;

/// SHA-256 digest length. Used for transaction IDs and HTLC secrets.
pub const HASH_LENGTH: usize = 32;

/// Upper bound on a serialized transaction. Multipayments with a raised
/// limit are the largest thing we expect to see.
pub const MAX_TRANSACTION_SIZE: usize = 256 * 1024;

// ---------------------------------------------------------------------------
// Type Groups
// ---------------------------------------------------------------------------

/// The type group every built-in transaction type lives in.
pub const TYPE_GROUP_CORE: u32 = 1;

/// Lowest type group available to plugin-defined transaction types.
/// Everything between core and this value is reserved.
pub const CUSTOM_TYPE_GROUP_MIN: u32 = 1000;

// ---------------------------------------------------------------------------
// Schema Limits
// ---------------------------------------------------------------------------

/// Hard ceiling on the vendor field. The length prefix is a single byte, so
/// this is also the physical limit.
pub const MAX_VENDOR_FIELD_LENGTH: usize = 255;

/// A multipayment with fewer than two payments is just a transfer wearing a
/// costume.
pub const MIN_MULTI_PAYMENTS: usize = 2;

/// Default maximum number of payments in one multipayment.
pub const DEFAULT_MULTI_PAYMENT_LIMIT: usize = 64;

/// Most payments that fit in [`MAX_TRANSACTION_SIZE`] after the header and
/// the u16 count, at 8 + 21 bytes each.
pub const MAX_MULTI_PAYMENT_LIMIT: usize =
    (MAX_TRANSACTION_SIZE - HEADER_LENGTH - 2) / (8 + ADDRESS_LENGTH);

/// Maximum participants in a multi-signature group. Indices are a single
/// byte, but verification cost grows linearly, so we stop well short of 255.
pub const MAX_MULTI_SIGNATURE_KEYS: usize = 16;

/// A vote transaction carries either a single vote/unvote or an
/// unvote-then-vote swap.
pub const MAX_VOTES: usize = 2;

/// Delegate usernames are short, lowercase, and boring on purpose.
pub const MAX_USERNAME_LENGTH: usize = 20;

/// Characters allowed in a delegate username besides `a-z` and `0-9`.
pub const USERNAME_SPECIAL_CHARS: &str = "!@$&_.";

/// Largest multihash digest accepted in an IPFS transaction.
pub const MAX_IPFS_DIGEST_LENGTH: usize = 64;

/// Maximum clock skew tolerated for transaction timestamps, in seconds.
pub const MAX_FUTURE_SECONDS: i64 = 300;

// ---------------------------------------------------------------------------
// Denomination
// ---------------------------------------------------------------------------

/// Smallest units per whole coin. Eight decimals, same as Bitcoin.
pub const SATOSHI_PER_COIN: u64 = 100_000_000;

/// Default dynamic fee multiplier (smallest units per byte).
pub const DEFAULT_FEE_MULTIPLIER: u64 = 3_000;

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Mainnet network byte. Mistakes here cost real money.
pub const NETWORK_MAINNET: u8 = 0x17;

/// Testnet network byte.
pub const NETWORK_TESTNET: u8 = 0x18;

/// Devnet network byte. Reset whenever someone feels like it.
pub const NETWORK_DEVNET: u8 = 0x1E;

/// Bech32 human-readable prefixes for addresses.
pub const MAINNET_HRP: &str = "tw";
pub const TESTNET_HRP: &str = "twt";
pub const DEVNET_HRP: &str = "twd";

/// Genesis epoch shared by all presets: 2017-03-21T13:00:00Z. Transaction
/// timestamps count seconds from here, which keeps them inside a `u32`
/// until well past anyone's retirement.
pub const DEFAULT_EPOCH_UNIX_SECS: i64 = 1_490_101_200;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`NetworkConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown network preset: {0}")]
    UnknownNetwork(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// NetworkConfig
// ---------------------------------------------------------------------------

/// Per-network parameters that influence encoding, addresses and fees.
///
/// Loaded from TOML:
///
/// ```toml
/// name = "localnet"
/// pub_key_hash = 42
/// hrp = "twl"
/// epoch = "2024-01-01T00:00:00Z"
/// multi_payment_limit = 128
/// ```
///
/// Omitted limits fall back to the crate defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Human-friendly name, used in logs.
    pub name: String,

    /// Network byte written into every transaction header and address.
    pub pub_key_hash: u8,

    /// Bech32 prefix for addresses on this network.
    pub hrp: String,

    /// Origin of the transaction timestamp clock.
    pub epoch: DateTime<Utc>,

    /// Maximum vendor field length in bytes.
    #[serde(default = "default_vendor_field_length")]
    pub max_vendor_field_length: usize,

    /// Maximum payments per multipayment.
    #[serde(default = "default_multi_payment_limit")]
    pub multi_payment_limit: usize,

    /// Smallest units charged per serialized byte by the dynamic fee formula.
    #[serde(default = "default_fee_multiplier")]
    pub fee_multiplier: u64,
}

fn default_vendor_field_length() -> usize {
    MAX_VENDOR_FIELD_LENGTH
}

fn default_multi_payment_limit() -> usize {
    DEFAULT_MULTI_PAYMENT_LIMIT
}

fn default_fee_multiplier() -> u64 {
    DEFAULT_FEE_MULTIPLIER
}

fn default_epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(DEFAULT_EPOCH_UNIX_SECS, 0)
        .single()
        .unwrap_or_default()
}

impl NetworkConfig {
    fn preset(name: &str, pub_key_hash: u8, hrp: &str) -> Self {
        Self {
            name: name.to_string(),
            pub_key_hash,
            hrp: hrp.to_string(),
            epoch: default_epoch(),
            max_vendor_field_length: MAX_VENDOR_FIELD_LENGTH,
            multi_payment_limit: DEFAULT_MULTI_PAYMENT_LIMIT,
            fee_multiplier: DEFAULT_FEE_MULTIPLIER,
        }
    }

    pub fn mainnet() -> Self {
        Self::preset("mainnet", NETWORK_MAINNET, MAINNET_HRP)
    }

    pub fn testnet() -> Self {
        Self::preset("testnet", NETWORK_TESTNET, TESTNET_HRP)
    }

    pub fn devnet() -> Self {
        Self::preset("devnet", NETWORK_DEVNET, DEVNET_HRP)
    }

    /// Looks up a preset by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::mainnet()),
            "testnet" => Ok(Self::testnet()),
            "devnet" => Ok(Self::devnet()),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Checks that the limits are physically encodable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hrp.is_empty() || bech32::Hrp::parse(&self.hrp).is_err() {
            return Err(ConfigError::Invalid(format!(
                "hrp '{}' is not a valid bech32 prefix",
                self.hrp
            )));
        }
        if self.max_vendor_field_length > MAX_VENDOR_FIELD_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "max_vendor_field_length {} exceeds the wire limit of {}",
                self.max_vendor_field_length, MAX_VENDOR_FIELD_LENGTH
            )));
        }
        if !(MIN_MULTI_PAYMENTS..=MAX_MULTI_PAYMENT_LIMIT).contains(&self.multi_payment_limit) {
            return Err(ConfigError::Invalid(format!(
                "multi_payment_limit must be within {}..={}, got {}",
                MIN_MULTI_PAYMENTS, MAX_MULTI_PAYMENT_LIMIT, self.multi_payment_limit
            )));
        }
        Ok(())
    }

    /// Seconds elapsed since the network epoch, as carried in the header.
    ///
    /// Saturates at zero for clocks set before the epoch, and at `u32::MAX`
    /// for clocks set absurdly far in the future.
    pub fn timestamp_at(&self, at: DateTime<Utc>) -> u32 {
        let secs = (at - self.epoch).num_seconds();
        secs.clamp(0, u32::MAX as i64) as u32
    }

    /// The current header timestamp.
    pub fn timestamp_now(&self) -> u32 {
        self.timestamp_at(Utc::now())
    }

    /// Converts a header timestamp back into wall-clock time.
    pub fn timestamp_to_datetime(&self, timestamp: u32) -> DateTime<Utc> {
        self.epoch + chrono::Duration::seconds(timestamp as i64)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::devnet()
    }
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns the address prefix for a known network byte.
/// Returns `None` for unrecognized networks.
pub fn hrp_for_network(network: u8) -> Option<&'static str> {
    match network {
        NETWORK_MAINNET => Some(MAINNET_HRP),
        NETWORK_TESTNET => Some(TESTNET_HRP),
        NETWORK_DEVNET => Some(DEVNET_HRP),
        _ => None,
    }
}

/// Reverse of [`hrp_for_network`].
pub fn network_for_hrp(hrp: &str) -> Option<u8> {
    match hrp {
        MAINNET_HRP => Some(NETWORK_MAINNET),
        TESTNET_HRP => Some(NETWORK_TESTNET),
        DEVNET_HRP => Some(NETWORK_DEVNET),
        _ => None,
    }
}

/// Returns a friendly name for a network byte, mainly for logging.
pub fn network_name(network: u8) -> String {
    match network {
        NETWORK_MAINNET => "mainnet".to_string(),
        NETWORK_TESTNET => "testnet".to_string(),
        NETWORK_DEVNET => "devnet".to_string(),
        other => format!("unknown(0x{:02X})", other),
    }
}
