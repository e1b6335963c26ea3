use bytes::Bytes;

use crate::{decode::DecodeError, ext::FmtExt, postgres::Oid};

/// Wire representation of a value payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Format {
    /// Human readable ASCII/UTF-8.
    Text,
    /// Type-specific packed bytes.
    Binary,
}

/// A single postgres wire value.
///
/// Carries the value's oid, the [`Format`] of its payload, and the payload
/// itself, where an absent payload is SQL `NULL`.
///
/// The payload is an owned [`Bytes`], the transport's receive buffer is
/// never borrowed past construction.
#[derive(Clone, PartialEq, Eq)]
pub struct PgValue {
    oid: Oid,
    format: Format,
    bytes: Option<Bytes>,
}

impl PgValue {
    /// Create a binary format value.
    pub fn binary(oid: Oid, bytes: impl Into<Bytes>) -> Self {
        Self { oid, format: Format::Binary, bytes: Some(bytes.into()) }
    }

    /// Create a text format value.
    pub fn text(oid: Oid, bytes: impl Into<Bytes>) -> Self {
        Self { oid, format: Format::Text, bytes: Some(bytes.into()) }
    }

    /// Create a `NULL` value.
    pub const fn null(oid: Oid) -> Self {
        Self { oid, format: Format::Binary, bytes: None }
    }

    /// Create a value from transport parts.
    pub fn from_parts(oid: Oid, format: Format, bytes: Option<Bytes>) -> Self {
        Self { oid, format, bytes }
    }

    /// Returns the value [`Oid`].
    pub const fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns the payload [`Format`].
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Return `true` if value is `NULL`.
    pub const fn is_null(&self) -> bool {
        self.bytes.is_none()
    }

    /// Extract the payload as slice.
    ///
    /// Returns [`None`] if value is `NULL`.
    pub fn as_slice(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Consume self into the payload.
    ///
    /// Returns [`None`] if value is `NULL`.
    pub fn into_bytes(self) -> Option<Bytes> {
        self.bytes
    }

    /// Try consume self into the payload.
    ///
    /// Returns [`DecodeError::Null`] if value is `NULL`.
    pub fn try_into_bytes(self) -> Result<Bytes, DecodeError> {
        self.bytes.ok_or(DecodeError::Null)
    }

    /// Try decode type using [`Decode`][crate::Decode] implementation.
    pub fn decode<D: crate::Decode>(self) -> Result<D, DecodeError> {
        D::decode(self)
    }
}

impl std::fmt::Debug for PgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("PgValue");
        dbg.field("oid", &self.oid).field("format", &self.format);
        match &self.bytes {
            Some(bytes) => dbg.field("bytes", &bytes[..].lossy()),
            None => dbg.field("bytes", &format_args!("NULL")),
        };
        dbg.finish()
    }
}
