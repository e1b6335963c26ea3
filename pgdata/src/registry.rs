//! Oid-driven dynamic codecs.
//!
//! Array decoding resolves its element codec from the wire metadata, which
//! is only known at run time. [`Registry`] maps an element oid to a codec,
//! lookup failure is [`DecodeError::ElementCodecMissing`], a recoverable
//! error, since a missing codec is ordinary misconfiguration.
use bytes::Bytes;
use std::collections::HashMap;

use crate::{
    array,
    decode::{Decode, DecodeError},
    encode::{Encode, EncodeError},
    postgres::{Oid, PgType, RegProc},
    value::{Format, PgValue},
};

/// A decoded value whose type was resolved at run time.
#[derive(Clone, PartialEq, Debug)]
pub enum AnyValue {
    Bool(bool),
    /// `"char"`, a single byte.
    Char(i8),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytea(Bytes),
    RegProc(RegProc),
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
    #[cfg(feature = "time")]
    Timestamp(time::PrimitiveDateTime),
    #[cfg(feature = "time")]
    TimestampTz(time::UtcDateTime),
    #[cfg(feature = "numeric")]
    Numeric(rust_decimal::Decimal),
}

macro_rules! any {
    ($( $(#[$meta:meta])* $ty:ty => $variant:ident, )*) => {
        $(
            $(#[$meta])*
            impl From<$ty> for AnyValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*

        impl AnyValue {
            /// Oid of the contained value's type.
            pub fn oid(&self) -> Oid {
                match self {
                    $( $(#[$meta])* Self::$variant(_) => <$ty>::OID, )*
                }
            }

            /// Encode the contained value.
            pub fn encode(&self) -> Result<PgValue, EncodeError> {
                match self {
                    $( $(#[$meta])* Self::$variant(value) => value.encode(), )*
                }
            }
        }
    };
}

any! {
    bool => Bool,
    i8 => Char,
    i16 => Int2,
    i32 => Int4,
    i64 => Int8,
    f32 => Float4,
    f64 => Float8,
    String => Text,
    Bytes => Bytea,
    RegProc => RegProc,
    #[cfg(feature = "uuid")]
    uuid::Uuid => Uuid,
    #[cfg(feature = "time")]
    time::PrimitiveDateTime => Timestamp,
    #[cfg(feature = "time")]
    time::UtcDateTime => TimestampTz,
    #[cfg(feature = "numeric")]
    rust_decimal::Decimal => Numeric,
}

type DecodeFn = fn(PgValue) -> Result<AnyValue, DecodeError>;

/// Codec entry resolving one scalar oid.
#[derive(Clone, Copy)]
pub struct Codec {
    oid: Oid,
    array_oid: Oid,
    decode: DecodeFn,
}

impl Codec {
    /// Codec entry backed by `T`'s [`Decode`] implementation.
    pub fn of<T>() -> Self
    where
        T: Decode + Into<AnyValue> + PgType,
    {
        Self {
            oid: T::OID,
            array_oid: T::ARRAY_OID,
            decode: |value| T::decode(value).map(Into::into),
        }
    }

    /// Scalar oid this codec resolves.
    pub const fn oid(&self) -> Oid {
        self.oid
    }

    /// Oid of "array of this codec's type".
    pub const fn array_oid(&self) -> Oid {
        self.array_oid
    }
}

/// Scalar codec lookup by oid.
pub struct Registry {
    codecs: HashMap<Oid, Codec>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self { codecs: HashMap::new() }
    }

    /// Registry with every built in scalar codec.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Codec::of::<bool>());
        registry.register(Codec::of::<i8>());
        registry.register(Codec::of::<i16>());
        registry.register(Codec::of::<i32>());
        registry.register(Codec::of::<i64>());
        registry.register(Codec::of::<f32>());
        registry.register(Codec::of::<f64>());
        registry.register(Codec::of::<String>());
        registry.register(Codec::of::<Bytes>());
        registry.register(Codec::of::<RegProc>());
        #[cfg(feature = "uuid")]
        registry.register(Codec::of::<uuid::Uuid>());
        #[cfg(feature = "time")]
        registry.register(Codec::of::<time::PrimitiveDateTime>());
        #[cfg(feature = "time")]
        registry.register(Codec::of::<time::UtcDateTime>());
        #[cfg(feature = "numeric")]
        registry.register(Codec::of::<rust_decimal::Decimal>());
        registry
    }

    /// Register a codec, replacing any codec already mapped to its oid.
    pub fn register(&mut self, codec: Codec) {
        #[cfg(feature = "log")]
        if self.codecs.contains_key(&codec.oid) {
            log::warn!("codec for oid {} replaced", codec.oid);
        }
        self.codecs.insert(codec.oid, codec);
    }

    /// Lookup the codec for a scalar oid.
    pub fn get(&self, oid: Oid) -> Option<&Codec> {
        self.codecs.get(&oid)
    }

    /// Decode a scalar value through its oid's codec.
    pub fn decode(&self, value: PgValue) -> Result<AnyValue, DecodeError> {
        let codec = self
            .codecs
            .get(&value.oid())
            .ok_or(DecodeError::ElementCodecMissing(value.oid()))?;
        (codec.decode)(value)
    }

    /// Decode an array whose element type is resolved from the wire metadata.
    ///
    /// `NULL` elements decode to [`None`].
    pub fn decode_array(&self, value: PgValue) -> Result<Vec<Option<AnyValue>>, DecodeError> {
        let oid = value.oid();
        let format = value.format();
        if format == Format::Text {
            return Err(DecodeError::Malformed(oid));
        }
        let mut buf = value.into_bytes().ok_or(DecodeError::NullArray)?;
        let Some(header) = array::read_header(oid, &mut buf)? else {
            return Ok(Vec::new());
        };
        // resolve once, before touching the element stream
        let codec = self
            .codecs
            .get(&header.element_oid)
            .ok_or(DecodeError::ElementCodecMissing(header.element_oid))?;
        let cap = (header.count as usize).min(buf.len() / 4 + 1);
        let mut elements = Vec::with_capacity(cap);
        for _ in 0..header.count {
            let element = array::read_element(header.element_oid, format, &mut buf)?;
            elements.push(match element.is_null() {
                true => None,
                false => Some((codec.decode)(element)?),
            });
        }
        Ok(elements)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut oids = self.codecs.keys().collect::<Vec<_>>();
        oids.sort();
        f.debug_struct("Registry").field("oids", &oids).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dynamic_scalar() {
        let registry = Registry::with_defaults();
        let value = 42i32.encode().unwrap();
        assert_eq!(registry.decode(value).unwrap(), AnyValue::Int4(42));
    }

    #[test]
    fn missing_codec_is_recoverable() {
        let registry = Registry::new();
        let value = 42i32.encode().unwrap();
        let err = registry.decode(value).unwrap_err();
        assert!(matches!(err, DecodeError::ElementCodecMissing(23)));
    }

    #[test]
    fn dynamic_array() {
        let registry = Registry::with_defaults();
        let value = vec![Some(42i32), None, Some(1337)].encode().unwrap();
        let back = registry.decode_array(value).unwrap();
        assert_eq!(
            back,
            [Some(AnyValue::Int4(42)), None, Some(AnyValue::Int4(1337))],
        );
    }

    #[test]
    fn dynamic_array_missing_element_codec() {
        let registry = Registry::new();
        let value = vec![1i32, 2].encode().unwrap();
        let err = registry.decode_array(value).unwrap_err();
        assert!(matches!(err, DecodeError::ElementCodecMissing(23)));
    }

    #[test]
    fn any_roundtrip() {
        let registry = Registry::with_defaults();
        let any = AnyValue::Text("Foo".into());
        let back = registry.decode(any.encode().unwrap()).unwrap();
        assert_eq!(back, any);
    }
}
