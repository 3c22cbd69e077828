//! The transaction type registry.
//!
//! The registry is a map from [`InternalType`] (the `(type group, type id)`
//! pair in every header) to the [`AssetCodec`] that knows that type's
//! payload schema. Encoding and decoding go through it (see
//! [`super::codec`]), so a transaction type exists exactly when a codec for
//! it is registered.
//!
//! ## Rules
//!
//! - Every core type (group 1) is registered at construction and can be
//!   neither replaced nor removed. Consensus depends on those byte layouts.
//! - Plugin types must live in groups `>= CUSTOM_TYPE_GROUP_MIN`; the groups
//!   in between are reserved for future core groups.
//! - Registering the same type twice is an error, not an overwrite.
//!
//! ## Sharing
//!
//! [`TransactionRegistry::core`] is a process-wide, read-only registry with
//! the built-in types and default limits. Anything that needs plugins or
//! non-default limits builds its own registry and passes it around; the
//! registry is `Send + Sync` and cheap to clone (codecs are `Arc`ed).

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use bytes::BytesMut;
use thiserror::Error;
use tracing::{debug, info};

use super::assets::core_codecs;
use super::codec::CodecError;
use super::types::{Asset, InternalType};
use super::wire::WireReader;
use crate::config::{
    NetworkConfig, CUSTOM_TYPE_GROUP_MIN, DEFAULT_MULTI_PAYMENT_LIMIT, MAX_VENDOR_FIELD_LENGTH,
};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Network-dependent schema limits the codecs enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    pub max_vendor_field_length: usize,
    pub multi_payment_limit: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_vendor_field_length: MAX_VENDOR_FIELD_LENGTH,
            multi_payment_limit: DEFAULT_MULTI_PAYMENT_LIMIT,
        }
    }
}

impl From<&NetworkConfig> for CodecLimits {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            max_vendor_field_length: config.max_vendor_field_length,
            multi_payment_limit: config.multi_payment_limit,
        }
    }
}

// ---------------------------------------------------------------------------
// AssetCodec
// ---------------------------------------------------------------------------

/// Schema and byte layout of one transaction type's payload.
///
/// Implementations never see the header or signatures; the registry handles
/// those. `validate` is the single source of truth for the schema: it runs
/// before every encode and after every decode, so `encode_asset` and
/// `decode_asset` only have to get the bytes right.
pub trait AssetCodec: Send + Sync {
    /// The wire identity this codec answers to.
    fn internal_type(&self) -> InternalType;

    /// Human-readable name for logs and the CLI.
    fn name(&self) -> &str;

    /// Smallest possible payload, in bytes. A decoder holding fewer bytes
    /// than this after the header rejects the input without trying.
    fn min_asset_length(&self) -> usize;

    /// Whether the type may carry a vendor field.
    fn supports_vendor_field(&self) -> bool {
        false
    }

    /// The fixed fee for this type, in the smallest unit.
    fn static_fee(&self, asset: Option<&Asset>) -> u64;

    /// Extra bytes charged by the dynamic fee formula.
    fn addon_bytes(&self) -> u64 {
        0
    }

    /// Checks that `asset` is exactly what this type requires.
    /// Violations are [`CodecError::InvalidTransaction`].
    fn validate(&self, asset: Option<&Asset>, limits: &CodecLimits) -> Result<(), CodecError>;

    /// Appends the payload bytes. Called only after `validate` succeeded.
    fn encode_asset(&self, asset: Option<&Asset>, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Reads the payload. Structural problems are
    /// [`CodecError::MalformedPayload`].
    fn decode_asset(&self, reader: &mut WireReader<'_>) -> Result<Option<Asset>, CodecError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised when changing the set of registered types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("transaction type {0} is already registered")]
    AlreadyRegistered(InternalType),

    #[error("core transaction type {0} cannot be replaced or removed")]
    CoreTypeProtected(InternalType),

    #[error("type group {0} is reserved; custom types start at group {CUSTOM_TYPE_GROUP_MIN}")]
    ReservedTypeGroup(u32),

    #[error("transaction type {0} is not registered")]
    NotRegistered(InternalType),
}

// ---------------------------------------------------------------------------
// TransactionRegistry
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TransactionRegistry {
    codecs: BTreeMap<InternalType, Arc<dyn AssetCodec>>,
    limits: CodecLimits,
}

static CORE_REGISTRY: OnceLock<TransactionRegistry> = OnceLock::new();

impl TransactionRegistry {
    /// A registry holding every core type, enforcing `limits`.
    pub fn new(limits: CodecLimits) -> Self {
        let codecs = core_codecs()
            .into_iter()
            .map(|codec| (codec.internal_type(), codec))
            .collect();
        Self { codecs, limits }
    }

    /// A registry configured from a network's parameters.
    pub fn for_network(config: &NetworkConfig) -> Self {
        Self::new(CodecLimits::from(config))
    }

    /// The shared core registry with default limits.
    pub fn core() -> &'static TransactionRegistry {
        CORE_REGISTRY.get_or_init(|| Self::new(CodecLimits::default()))
    }

    pub fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    /// Adds a plugin codec.
    pub fn register(&mut self, codec: Arc<dyn AssetCodec>) -> Result<(), RegistryError> {
        let internal_type = codec.internal_type();
        if internal_type.is_core() {
            return Err(RegistryError::CoreTypeProtected(internal_type));
        }
        if internal_type.group < CUSTOM_TYPE_GROUP_MIN {
            return Err(RegistryError::ReservedTypeGroup(internal_type.group));
        }
        if self.codecs.contains_key(&internal_type) {
            return Err(RegistryError::AlreadyRegistered(internal_type));
        }

        info!(internal_type = %internal_type, name = codec.name(), "registered transaction type");
        self.codecs.insert(internal_type, codec);
        Ok(())
    }

    /// Removes a plugin codec and hands it back.
    pub fn deregister(
        &mut self,
        internal_type: InternalType,
    ) -> Result<Arc<dyn AssetCodec>, RegistryError> {
        if internal_type.is_core() {
            return Err(RegistryError::CoreTypeProtected(internal_type));
        }
        let codec = self
            .codecs
            .remove(&internal_type)
            .ok_or(RegistryError::NotRegistered(internal_type))?;
        info!(internal_type = %internal_type, name = codec.name(), "deregistered transaction type");
        Ok(codec)
    }

    pub fn is_registered(&self, internal_type: InternalType) -> bool {
        self.codecs.contains_key(&internal_type)
    }

    /// Looks up the codec for a type. Unknown types are a codec error because
    /// this is almost always called while reading or writing a transaction.
    pub fn codec_for(&self, internal_type: InternalType) -> Result<&dyn AssetCodec, CodecError> {
        match self.codecs.get(&internal_type) {
            Some(codec) => Ok(codec.as_ref()),
            None => {
                debug!(internal_type = %internal_type, "no codec registered");
                Err(CodecError::UnknownType { internal_type })
            }
        }
    }

    /// All registered codecs in `(group, id)` order.
    pub fn codecs(&self) -> impl Iterator<Item = &dyn AssetCodec> {
        self.codecs.values().map(|codec| codec.as_ref())
    }

    /// `(internal type, name)` of every registered codec.
    pub fn types(&self) -> impl Iterator<Item = (InternalType, &str)> {
        self.codecs().map(|codec| (codec.internal_type(), codec.name()))
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new(CodecLimits::default())
    }
}

impl std::fmt::Debug for TransactionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionRegistry")
            .field("types", &self.codecs.keys().collect::<Vec<_>>())
            .field("limits", &self.limits)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
