//! # Addresses
//!
//! An address identifies a recipient without revealing their public key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3(public_key)[..20]           key hash
//!     -> network byte || key hash           21 bytes on the wire
//!     -> Bech32(hrp(network), key hash)     tw1qw508d6qe...
//! ```
//!
//! The network byte is implied by the Bech32 prefix, so the human-readable
//! form carries only the hash. Addresses on networks without a known prefix
//! fall back to `0x` + hex of all 21 bytes; ugly, but lossless.

use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{hrp_for_network, network_for_hrp, ADDRESS_HASH_LENGTH, ADDRESS_LENGTH};
use crate::crypto::hash::address_hash;
use crate::crypto::keys::PublicKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing or rendering an address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The Bech32 prefix doesn't belong to any known network.
    #[error("unknown address prefix '{0}'")]
    UnknownHrp(String),

    /// The prefix is not what the caller asked for.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected {expected} bytes, got {got}")]
    InvalidDataLength { expected: usize, got: usize },

    /// The hex fallback form could not be decoded.
    #[error("invalid hex address: {0}")]
    InvalidHex(String),
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 21-byte recipient address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    network: u8,
    key_hash: [u8; ADDRESS_HASH_LENGTH],
}

impl Address {
    pub fn new(network: u8, key_hash: [u8; ADDRESS_HASH_LENGTH]) -> Self {
        Self { network, key_hash }
    }

    /// Derives the address owned by `public_key` on `network`.
    pub fn from_public_key(public_key: &PublicKey, network: u8) -> Self {
        Self {
            network,
            key_hash: address_hash(public_key.as_bytes()),
        }
    }

    pub fn network(&self) -> u8 {
        self.network
    }

    pub fn key_hash(&self) -> &[u8; ADDRESS_HASH_LENGTH] {
        &self.key_hash
    }

    /// Returns `true` if `public_key` hashes to this address.
    pub fn is_owned_by(&self, public_key: &PublicKey) -> bool {
        address_hash(public_key.as_bytes()) == self.key_hash
    }

    /// Wire form: network byte followed by the key hash.
    pub fn to_bytes(&self) -> [u8; ADDRESS_LENGTH] {
        let mut out = [0u8; ADDRESS_LENGTH];
        out[0] = self.network;
        out[1..].copy_from_slice(&self.key_hash);
        out
    }

    pub fn from_bytes(bytes: &[u8; ADDRESS_LENGTH]) -> Self {
        let mut key_hash = [0u8; ADDRESS_HASH_LENGTH];
        key_hash.copy_from_slice(&bytes[1..]);
        Self {
            network: bytes[0],
            key_hash,
        }
    }

    /// Bech32 rendering under an explicit prefix, for networks loaded from
    /// config that the static prefix table doesn't know about.
    pub fn to_bech32(&self, hrp: &str) -> Result<String, AddressError> {
        let hrp = Hrp::parse(hrp).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &self.key_hash)
            .map_err(|e| AddressError::Bech32Decode(e.to_string()))
    }

    /// Parses a Bech32 address that must carry `hrp`, assigning it `network`.
    pub fn from_bech32(s: &str, hrp: &str, network: u8) -> Result<Self, AddressError> {
        let (got, data) = bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;
        if !got.as_str().eq_ignore_ascii_case(hrp) {
            return Err(AddressError::InvalidHrp {
                expected: hrp.to_string(),
                got: got.to_string(),
            });
        }
        Self::from_hash_slice(network, &data)
    }

    fn from_hash_slice(network: u8, data: &[u8]) -> Result<Self, AddressError> {
        let key_hash: [u8; ADDRESS_HASH_LENGTH] =
            data.try_into()
                .map_err(|_| AddressError::InvalidDataLength {
                    expected: ADDRESS_HASH_LENGTH,
                    got: data.len(),
                })?;
        Ok(Self { network, key_hash })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match hrp_for_network(self.network).map(|hrp| self.to_bech32(hrp)) {
            Some(Ok(s)) => write!(f, "{}", s),
            _ => write!(f, "0x{}", hex::encode(self.to_bytes())),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex_part) = s.strip_prefix("0x") {
            let bytes = hex::decode(hex_part).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
            let bytes: [u8; ADDRESS_LENGTH] =
                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| AddressError::InvalidDataLength {
                        expected: ADDRESS_LENGTH,
                        got: bytes.len(),
                    })?;
            return Ok(Self::from_bytes(&bytes));
        }

        let (hrp, data) = bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;
        let hrp = hrp.as_str().to_ascii_lowercase();
        let network = network_for_hrp(&hrp).ok_or(AddressError::UnknownHrp(hrp))?;
        Self::from_hash_slice(network, &data)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAINNET_HRP, NETWORK_DEVNET, NETWORK_MAINNET};
    use crate::crypto::keys::Keypair;

    #[test]
    fn address_from_public_key_has_network_prefix() {
        let pk = Keypair::from_passphrase("alice").public_key();
        let address = Address::from_public_key(&pk, NETWORK_MAINNET);
        let s = address.to_string();
        assert!(s.starts_with("tw1"), "got {}", s);
        assert!(address.is_owned_by(&pk));
    }

    #[test]
    fn bech32_roundtrip() {
        let pk = Keypair::from_passphrase("bob").public_key();
        let address = Address::from_public_key(&pk, NETWORK_DEVNET);
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);
        assert_eq!(parsed.network(), NETWORK_DEVNET);
    }

    #[test]
    fn unknown_network_falls_back_to_hex() {
        let address = Address::new(0x42, [9u8; ADDRESS_HASH_LENGTH]);
        let s = address.to_string();
        assert!(s.starts_with("0x42"));
        assert_eq!(s.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn explicit_hrp_roundtrip() {
        let address = Address::new(0x42, [1u8; ADDRESS_HASH_LENGTH]);
        let s = address.to_bech32("twl").unwrap();
        assert_eq!(Address::from_bech32(&s, "twl", 0x42).unwrap(), address);
        assert!(matches!(
            Address::from_bech32(&s, MAINNET_HRP, NETWORK_MAINNET),
            Err(AddressError::InvalidHrp { .. })
        ));
    }

    #[test]
    fn unknown_prefix_rejected() {
        let hrp = Hrp::parse("btc").unwrap();
        let encoded = bech32::encode::<Bech32>(hrp, &[0u8; ADDRESS_HASH_LENGTH]).unwrap();
        assert!(matches!(
            encoded.parse::<Address>(),
            Err(AddressError::UnknownHrp(_))
        ));
    }

    #[test]
    fn wrong_hash_length_rejected() {
        let hrp = Hrp::parse(MAINNET_HRP).unwrap();
        let encoded = bech32::encode::<Bech32>(hrp, &[0u8; 32]).unwrap();
        assert!(matches!(
            encoded.parse::<Address>(),
            Err(AddressError::InvalidDataLength { expected: 20, got: 32 })
        ));
    }

    #[test]
    fn wire_bytes_roundtrip() {
        let address = Address::new(NETWORK_MAINNET, [0xAB; ADDRESS_HASH_LENGTH]);
        let bytes = address.to_bytes();
        assert_eq!(bytes[0], NETWORK_MAINNET);
        assert_eq!(Address::from_bytes(&bytes), address);
    }

    #[test]
    fn serde_uses_display_form() {
        let address = Address::from_public_key(&Keypair::from_passphrase("carol").public_key(), NETWORK_MAINNET);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);
    }
}
