//! Wire value decoding.
use bytes::Bytes;
use std::{borrow::Cow, fmt, str::FromStr};

use crate::{
    common::ByteStr,
    postgres::{Oid, PgType, RegProc},
    value::{Format, PgValue},
};

/// Type that can be decoded from a wire value.
pub trait Decode: Sized {
    /// Construct self from a wire value.
    fn decode(value: PgValue) -> Result<Self, DecodeError>;
}

impl Decode for PgValue {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        Ok(value)
    }
}

impl Decode for () {
    fn decode(_: PgValue) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        match value.is_null() {
            true => Ok(None),
            false => value.decode().map(Some),
        }
    }
}

/// Verify the value oid against the implementation's oid.
pub(crate) fn check_oid<T: PgType>(value: &PgValue) -> Result<(), DecodeError> {
    match value.oid() == T::OID {
        true => Ok(()),
        false => Err(DecodeError::OidMismatch { expected: T::OID, got: value.oid() }),
    }
}

/// Parse a text format payload.
pub(crate) fn text<T: FromStr>(oid: Oid, bytes: &[u8]) -> Result<T, DecodeError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(DecodeError::Malformed(oid))
}

/// Binary payload of an exact width.
pub(crate) fn fixed<const N: usize>(oid: Oid, bytes: &[u8]) -> Result<[u8; N], DecodeError> {
    bytes.try_into().map_err(|_| DecodeError::Malformed(oid))
}

macro_rules! number {
    ($ty:ty) => {
        impl Decode for $ty {
            fn decode(value: PgValue) -> Result<Self, DecodeError> {
                check_oid::<Self>(&value)?;
                let format = value.format();
                let bytes = value.try_into_bytes()?;
                match format {
                    Format::Binary => Ok(<$ty>::from_be_bytes(fixed(Self::OID, &bytes)?)),
                    Format::Text => text(Self::OID, &bytes),
                }
            }
        }
    };
}

number!(i16);
number!(i32);
number!(i64);
number!(f32);
number!(f64);

macro_rules! narrow {
    ($ty:ty => $wire:ty) => {
        impl Decode for $ty {
            fn decode(value: PgValue) -> Result<Self, DecodeError> {
                check_oid::<Self>(&value)?;
                let format = value.format();
                let bytes = value.try_into_bytes()?;
                match format {
                    Format::Binary => {
                        let wide = <$wire>::from_be_bytes(fixed(Self::OID, &bytes)?);
                        <$ty>::try_from(wide).map_err(|_| DecodeError::Malformed(Self::OID))
                    },
                    Format::Text => text(Self::OID, &bytes),
                }
            }
        }
    };
}

narrow!(u16 => i16);
narrow!(u32 => i32);
narrow!(u64 => i64);

impl Decode for i8 {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        match format {
            Format::Binary => Ok(fixed::<1>(Self::OID, &bytes)?[0] as i8),
            Format::Text => text(Self::OID, &bytes),
        }
    }
}

impl Decode for u8 {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        match format {
            Format::Binary => Ok(fixed::<1>(Self::OID, &bytes)?[0]),
            Format::Text => text(Self::OID, &bytes),
        }
    }
}

impl Decode for char {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        match format {
            Format::Binary => Ok(char::from(fixed::<1>(Self::OID, &bytes)?[0])),
            Format::Text => {
                let s = std::str::from_utf8(&bytes).map_err(|_| DecodeError::Malformed(Self::OID))?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(DecodeError::Malformed(Self::OID)),
                }
            },
        }
    }
}

impl Decode for bool {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        match format {
            Format::Binary => match fixed::<1>(Self::OID, &bytes)?[0] {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(DecodeError::Malformed(Self::OID)),
            },
            Format::Text => match &bytes[..] {
                b"t" | b"true" => Ok(true),
                b"f" | b"false" => Ok(false),
                _ => Err(DecodeError::Malformed(Self::OID)),
            },
        }
    }
}

impl Decode for String {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let bytes = value.try_into_bytes()?;
        String::from_utf8(bytes.into()).map_err(|_| DecodeError::Malformed(Self::OID))
    }
}

impl Decode for Bytes {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        value.try_into_bytes()
    }
}

impl Decode for RegProc {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        match format {
            Format::Binary => Ok(RegProc(u32::from_be_bytes(fixed(Self::OID, &bytes)?))),
            Format::Text => text(Self::OID, &bytes).map(RegProc),
        }
    }
}

#[cfg(feature = "json")]
macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for DecodeError {
            fn from($pat: $ty) -> Self {
                $body
            }
        }
    };
}

/// An error when decoding a wire value.
pub enum DecodeError {
    /// Value is `NULL` where a concrete value is required.
    Null,
    /// Payload present but does not parse as the target type.
    Malformed(Oid),
    /// Value oid differs from the target type's oid.
    OidMismatch {
        expected: Oid,
        got: Oid,
    },
    /// Whole array is `NULL` where a concrete, possibly empty, sequence is required.
    NullArray,
    /// Array element oid has no registered codec.
    ElementCodecMissing(Oid),
    /// Array structure is inconsistent with the remaining payload.
    Truncated,
    /// Column requested not found.
    ColumnNotFound(Cow<'static, str>),
    /// Index requested is out of bounds.
    IndexOutOfBounds(usize),
    /// Failure decoding a named column.
    Field {
        column: ByteStr,
        source: Box<DecodeError>,
    },
    /// Failed to deserialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

#[cfg(feature = "json")]
from!(<serde_json::Error>e => Self::Json(e));

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode value, ")?;
        match self {
            Self::Null => write!(f, "unexpected NULL value"),
            Self::Malformed(oid) => write!(f, "malformed payload for oid {oid}"),
            Self::OidMismatch { expected, got } => {
                write!(f, "oid missmatch, expected {expected} got {got}")
            },
            Self::NullArray => write!(f, "unexpected NULL array"),
            Self::ElementCodecMissing(oid) => write!(f, "no codec registered for oid {oid}"),
            Self::Truncated => write!(f, "array payload truncated"),
            Self::ColumnNotFound(name) => write!(f, "column not found: {name:?}"),
            Self::IndexOutOfBounds(u) => write!(f, "index out of bounds: {u:?}"),
            Self::Field { column, source } => write!(f, "column {column:?}: {source}"),
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DecodeError { }

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null_scalar() {
        let err = i32::decode(PgValue::null(i32::OID)).unwrap_err();
        assert!(matches!(err, DecodeError::Null));
    }

    #[test]
    fn wrong_width_is_malformed() {
        // int4 payload fed to the int8 shape and vice versa
        let short = PgValue::binary(i64::OID, Bytes::copy_from_slice(&42i32.to_be_bytes()));
        assert!(matches!(i64::decode(short), Err(DecodeError::Malformed(20))));

        let long = PgValue::binary(i32::OID, Bytes::copy_from_slice(&42i64.to_be_bytes()));
        assert!(matches!(i32::decode(long), Err(DecodeError::Malformed(23))));
    }

    #[test]
    fn oid_missmatch() {
        let value = PgValue::binary(i32::OID, Bytes::copy_from_slice(&1i32.to_be_bytes()));
        let err = String::decode(value).unwrap_err();
        assert!(matches!(err, DecodeError::OidMismatch { expected: 25, got: 23 }));
    }

    #[test]
    fn text_format() {
        assert_eq!(i32::decode(PgValue::text(i32::OID, "-420")).unwrap(), -420);
        assert_eq!(f64::decode(PgValue::text(f64::OID, "2.5")).unwrap(), 2.5);
        assert!(bool::decode(PgValue::text(bool::OID, "t")).unwrap());
        assert!(!bool::decode(PgValue::text(bool::OID, "false")).unwrap());

        let err = i32::decode(PgValue::text(i32::OID, "four")).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(23)));
    }

    #[test]
    fn unsigned_narrowing() {
        let value = PgValue::binary(u16::OID, Bytes::copy_from_slice(&1024i16.to_be_bytes()));
        assert_eq!(u16::decode(value).unwrap(), 1024);

        // negative int2 is out of range for u16
        let value = PgValue::binary(u16::OID, Bytes::copy_from_slice(&(-1i16).to_be_bytes()));
        assert!(matches!(u16::decode(value), Err(DecodeError::Malformed(21))));
    }

    #[test]
    fn optional() {
        assert_eq!(Option::<i32>::decode(PgValue::null(i32::OID)).unwrap(), None);

        let value = PgValue::binary(i32::OID, Bytes::copy_from_slice(&7i32.to_be_bytes()));
        assert_eq!(Option::<i32>::decode(value).unwrap(), Some(7));
    }

    #[test]
    fn bool_binary() {
        let value = PgValue::binary(bool::OID, Bytes::copy_from_slice(&[1]));
        assert!(bool::decode(value).unwrap());

        let value = PgValue::binary(bool::OID, Bytes::copy_from_slice(&[7]));
        assert!(matches!(bool::decode(value), Err(DecodeError::Malformed(16))));
    }
}
