//! Wire value encoding.
//!
//! Encoding always emits [`Format::Binary`][crate::Format::Binary] payloads.
use bytes::Bytes;
use std::fmt;

use crate::{
    postgres::{Oid, PgType, RegProc},
    value::PgValue,
};

/// Value that can be encoded into a wire value.
pub trait Encode {
    /// Encode self into a wire value.
    ///
    /// A value that has no representation in its wire type, e.g. an integer
    /// out of the wire width's range, fails with
    /// [`EncodeError::Unrepresentable`] before any bytes are produced.
    fn encode(&self) -> Result<PgValue, EncodeError>;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        T::encode(self)
    }
}

impl<T: Encode + PgType> Encode for Option<T> {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        match self {
            Some(value) => value.encode(),
            None => Ok(PgValue::null(T::OID)),
        }
    }
}

macro_rules! number {
    ($ty:ty) => {
        impl Encode for $ty {
            fn encode(&self) -> Result<PgValue, EncodeError> {
                Ok(PgValue::binary(Self::OID, Bytes::copy_from_slice(&self.to_be_bytes())))
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
        impl Encode for $ty {
            fn encode(&self) -> Result<PgValue, EncodeError> {
                let wide = <$wire>::try_from(*self)
                    .map_err(|_| EncodeError::Unrepresentable(Self::OID))?;
                Ok(PgValue::binary(Self::OID, Bytes::copy_from_slice(&wide.to_be_bytes())))
            }
        }
    };
}

narrow!(u16 => i16);
narrow!(u32 => i32);
narrow!(u64 => i64);

impl Encode for bool {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        Ok(PgValue::binary(Self::OID, Bytes::copy_from_slice(&[*self as u8])))
    }
}

impl Encode for i8 {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        Ok(PgValue::binary(Self::OID, Bytes::copy_from_slice(&[*self as u8])))
    }
}

impl Encode for u8 {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        Ok(PgValue::binary(Self::OID, Bytes::copy_from_slice(&[*self])))
    }
}

impl Encode for char {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        // `"char"` is a single byte on the wire
        if !self.is_ascii() {
            return Err(EncodeError::Unrepresentable(Self::OID));
        }
        Ok(PgValue::binary(Self::OID, Bytes::copy_from_slice(&[*self as u8])))
    }
}

impl Encode for str {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        Ok(PgValue::binary(Self::OID, Bytes::copy_from_slice(self.as_bytes())))
    }
}

impl Encode for String {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        self.as_str().encode()
    }
}

impl Encode for Bytes {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        Ok(PgValue::binary(Self::OID, self.clone()))
    }
}

impl Encode for RegProc {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        Ok(PgValue::binary(Self::OID, Bytes::copy_from_slice(&self.0.to_be_bytes())))
    }
}

/// An error when encoding a value.
pub enum EncodeError {
    /// Value has no representation in its wire type.
    Unrepresentable(Oid),
    /// Failed to serialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for EncodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to encode value, ")?;
        match self {
            Self::Unrepresentable(oid) => write!(f, "value unrepresentable as oid {oid}"),
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EncodeError { }

impl fmt::Debug for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Decode;

    #[test]
    fn scalar_roundtrip() {
        assert_eq!(i16::decode(i16::MIN.encode().unwrap()).unwrap(), i16::MIN);
        assert_eq!(i32::decode(i32::MAX.encode().unwrap()).unwrap(), i32::MAX);
        assert_eq!(i64::decode(i64::MIN.encode().unwrap()).unwrap(), i64::MIN);
        assert_eq!(f64::decode(2.5f64.encode().unwrap()).unwrap(), 2.5);
        assert_eq!(String::decode("".encode().unwrap()).unwrap(), "");
        assert_eq!(String::decode("Foo".encode().unwrap()).unwrap(), "Foo");
        assert_eq!(char::decode('x'.encode().unwrap()).unwrap(), 'x');
        assert!(bool::decode(true.encode().unwrap()).unwrap());

        let empty = Bytes::new();
        assert_eq!(Bytes::decode(empty.encode().unwrap()).unwrap(), Bytes::new());
    }

    #[test]
    fn unsigned_roundtrip() {
        assert_eq!(u16::decode(1024u16.encode().unwrap()).unwrap(), 1024);
        assert_eq!(u32::decode(7u32.encode().unwrap()).unwrap(), 7);
        assert_eq!(u64::decode(42u64.encode().unwrap()).unwrap(), 42);
    }

    #[test]
    fn unrepresentable() {
        let err = u16::MAX.encode().unwrap_err();
        assert!(matches!(err, EncodeError::Unrepresentable(21)));

        let err = u64::MAX.encode().unwrap_err();
        assert!(matches!(err, EncodeError::Unrepresentable(20)));

        let err = 'é'.encode().unwrap_err();
        assert!(matches!(err, EncodeError::Unrepresentable(18)));
    }

    #[test]
    fn null_option() {
        let value = Option::<i32>::None.encode().unwrap();
        assert!(value.is_null());
        assert_eq!(value.oid(), i32::OID);
    }
}
