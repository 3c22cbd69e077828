//! Bounds-checked primitives for reading and writing the wire format.
//!
//! `bytes::Buf` panics when asked for more than it has, which is the wrong
//! reaction to a truncated transaction from a stranger. [`WireReader`] checks
//! the remaining length before every read and turns a short buffer into
//! [`CodecError::MalformedPayload`] that names the field it was reading.
//!
//! Writing can't fail, so it's just `BufMut` on a `BytesMut` plus a few
//! helpers for the composite types.

use bytes::{Buf, BufMut, BytesMut};

use super::codec::CodecError;
use super::types::TransactionId;
use crate::config::{ADDRESS_LENGTH, HASH_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::crypto::keys::{PublicKey, Signature};
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Cursor over a serialized transaction.
pub struct WireReader<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            len: buf.len(),
        }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Offset of the next byte, from the start of the input.
    pub fn position(&self) -> usize {
        self.len - self.remaining()
    }

    /// Fails unless at least `n` bytes remain.
    pub fn ensure(&self, n: usize, field: &str) -> Result<(), CodecError> {
        if self.remaining() < n {
            return Err(CodecError::malformed(format!(
                "truncated {}: need {} bytes at offset {}, {} left",
                field,
                n,
                self.position(),
                self.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self, field: &str) -> Result<u8, CodecError> {
        self.ensure(1, field)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self, field: &str) -> Result<u16, CodecError> {
        self.ensure(2, field)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self, field: &str) -> Result<u32, CodecError> {
        self.ensure(4, field)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self, field: &str) -> Result<u64, CodecError> {
        self.ensure(8, field)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn read_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], CodecError> {
        self.ensure(N, field)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// Borrows the next `n` bytes without copying.
    pub fn read_slice(&mut self, n: usize, field: &str) -> Result<&'a [u8], CodecError> {
        self.ensure(n, field)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub fn read_public_key(&mut self, field: &str) -> Result<PublicKey, CodecError> {
        self.read_array::<PUBLIC_KEY_LENGTH>(field)
            .map(PublicKey::from_bytes)
    }

    pub fn read_signature(&mut self, field: &str) -> Result<Signature, CodecError> {
        self.read_array::<SIGNATURE_LENGTH>(field)
            .map(Signature::from_bytes)
    }

    pub fn read_address(&mut self, field: &str) -> Result<Address, CodecError> {
        self.read_array::<ADDRESS_LENGTH>(field)
            .map(|bytes| Address::from_bytes(&bytes))
    }

    pub fn read_transaction_id(&mut self, field: &str) -> Result<TransactionId, CodecError> {
        self.read_array::<HASH_LENGTH>(field)
            .map(TransactionId::from_bytes)
    }

    /// Reads a `u8`-length-prefixed UTF-8 string.
    pub fn read_short_string(&mut self, field: &str) -> Result<String, CodecError> {
        let len = self.read_u8(field)? as usize;
        let raw = self.read_slice(len, field)?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| CodecError::malformed(format!("{} is not valid UTF-8", field)))
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub fn put_public_key(buf: &mut BytesMut, key: &PublicKey) {
    buf.put_slice(key.as_bytes());
}

pub fn put_signature(buf: &mut BytesMut, signature: &Signature) {
    buf.put_slice(signature.as_bytes());
}

pub fn put_address(buf: &mut BytesMut, address: &Address) {
    buf.put_slice(&address.to_bytes());
}

/// Writes a `u8`-length-prefixed string. The caller guarantees it fits.
pub fn put_short_string(buf: &mut BytesMut, s: &str) {
    buf.put_u8(s.len() as u8);
    buf.put_slice(s.as_bytes());
}
