//! # Identity Module
//!
//! Recipients are addressed by a short hash of their public key rather than
//! the key itself. See [`address`] for the derivation and string formats.

pub mod address;

pub use address::{Address, AddressError};
