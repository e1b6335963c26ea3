//! Decode shape classification.
//!
//! [`classify`] determines whether a type decodes as a single primitive or
//! as a keyed group of named sub-values, without any type metadata. The
//! probe is a [`Deserializer`][serde::Deserializer], the same interface a
//! real column decoder drives, configured to answer every leaf query from a
//! single boolean sentinel and to report every requested key as present.
//!
//! Two structurally identical probe runs execute, one answering
//! "false/0/empty" everywhere and one answering "true/1/non-empty". Both
//! must succeed, and the shape and leaf count each run observed must agree,
//! otherwise the type's decoding is input-dependent and cannot be
//! classified.
//!
//! Types whose decoding requests a sequence, tuple, or enum shape are not
//! supported, classification fails with [`ReflectError::Unsupported`]
//! instead of guessing.
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, Visitor};
use std::{
    any::TypeId,
    cell::Cell,
    collections::HashMap,
    fmt,
    sync::{OnceLock, RwLock},
};

use crate::common::{span, verbose};

/// Decode shape of a type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Arity {
    /// Decodes by consuming a single primitive value.
    Scalar,
    /// Decodes by recursing into named sub-values.
    Keyed,
}

/// Classify the decode shape of `T`, memoized per type.
///
/// The classification is stable for the lifetime of the type definition,
/// so results are cached. Concurrent first-time classification of the same
/// type may run redundantly, the computation is pure and idempotent.
pub fn classify<T: DeserializeOwned + 'static>() -> Result<Arity, ReflectError> {
    let id = TypeId::of::<T>();
    if let Some(hit) = cache().read().unwrap_or_else(|e| e.into_inner()).get(&id) {
        return hit.clone();
    }
    let result = classify_uncached::<T>();
    verbose!("classified {} as {:?}", std::any::type_name::<T>(), result);
    cache()
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(id, result.clone());
    result
}

/// Classify the decode shape of `T` without consulting the cache.
pub fn classify_uncached<T: DeserializeOwned>() -> Result<Arity, ReflectError> {
    span!("classify", ty = std::any::type_name::<T>());
    let zero = probe_run::<T>(false)?;
    let one = probe_run::<T>(true)?;
    if zero != one {
        return Err(ReflectError::Divergent);
    }
    Ok(zero.0)
}

fn cache() -> &'static RwLock<HashMap<TypeId, Result<Arity, ReflectError>>> {
    static CACHE: OnceLock<RwLock<HashMap<TypeId, Result<Arity, ReflectError>>>> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Drive `T`'s decoding against one sentinel context.
///
/// Returns the shape served at the outermost position and the number of
/// leaves consumed.
fn probe_run<T: DeserializeOwned>(sentinel: bool) -> Result<(Arity, u32), ReflectError> {
    let shape = Cell::new(None);
    let leaves = Cell::new(0);
    let probe = Probe { sentinel, shape: &shape, leaves: &leaves };
    if let Err(err) = T::deserialize(probe) {
        return Err(match err {
            ProbeError::Unsupported(what) => ReflectError::Unsupported(what),
            ProbeError::Message(msg) => ReflectError::Probe(msg),
        });
    }
    // a decode that consumed nothing behaves as a leaf
    Ok((shape.get().unwrap_or(Arity::Scalar), leaves.get()))
}

/// Sentinel decoding context.
///
/// Answers every primitive query deterministically from `sentinel` and
/// never reports a missing key, so a type's decode logic takes the same
/// structural path it would against a real source.
#[derive(Clone, Copy)]
struct Probe<'a> {
    sentinel: bool,
    shape: &'a Cell<Option<Arity>>,
    leaves: &'a Cell<u32>,
}

impl Probe<'_> {
    fn leaf(self) {
        if self.shape.get().is_none() {
            self.shape.set(Some(Arity::Scalar));
        }
        self.leaves.set(self.leaves.get() + 1);
    }

    fn keyed(self) {
        if self.shape.get().is_none() {
            self.shape.set(Some(Arity::Keyed));
        }
    }
}

macro_rules! leaf {
    ($sentinel:ident; $($de:ident => $visit:ident($value:expr),)*) => {
        $(
            fn $de<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                self.leaf();
                let $sentinel = self.sentinel;
                visitor.$visit($value)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Probe<'_> {
    type Error = ProbeError;

    fn deserialize_any<V: Visitor<'de>>(self, _: V) -> Result<V::Value, Self::Error> {
        Err(ProbeError::Unsupported("self-describing"))
    }

    leaf! {
        sentinel;
        deserialize_bool => visit_bool(sentinel),
        deserialize_i8 => visit_i8(sentinel as i8),
        deserialize_i16 => visit_i16(sentinel as i16),
        deserialize_i32 => visit_i32(sentinel as i32),
        deserialize_i64 => visit_i64(sentinel as i64),
        deserialize_u8 => visit_u8(sentinel as u8),
        deserialize_u16 => visit_u16(sentinel as u16),
        deserialize_u32 => visit_u32(sentinel as u32),
        deserialize_u64 => visit_u64(sentinel as u64),
        deserialize_f32 => visit_f32(sentinel as u8 as f32),
        deserialize_f64 => visit_f64(sentinel as u8 as f64),
        deserialize_char => visit_char(if sentinel { '1' } else { '0' }),
        deserialize_str => visit_str(if sentinel { "1" } else { "" }),
        deserialize_string => visit_str(if sentinel { "1" } else { "" }),
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.leaf();
        let bytes: &[u8] = if self.sentinel { &[1] } else { &[] };
        visitor.visit_bytes(bytes)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        // every optional is answered as present
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.leaf();
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _: V) -> Result<V::Value, Self::Error> {
        Err(ProbeError::Unsupported("sequence"))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _: usize, _: V) -> Result<V::Value, Self::Error> {
        Err(ProbeError::Unsupported("tuple"))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _: &'static str,
        _: usize,
        _: V,
    ) -> Result<V::Value, Self::Error> {
        Err(ProbeError::Unsupported("tuple struct"))
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        // free-form maps have no key list to serve, an empty keyed
        // container still exposes the shape
        self.keyed();
        visitor.visit_map(Fields { probe: self, fields: [].iter() })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.keyed();
        visitor.visit_map(Fields { probe: self, fields: fields.iter() })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _: &'static str,
        _: &'static [&'static str],
        _: V,
    ) -> Result<V::Value, Self::Error> {
        Err(ProbeError::Unsupported("enum"))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, _: V) -> Result<V::Value, Self::Error> {
        Err(ProbeError::Unsupported("identifier"))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

/// Keyed container answering every field in the type's field list.
struct Fields<'a> {
    probe: Probe<'a>,
    fields: std::slice::Iter<'static, &'static str>,
}

impl<'de> MapAccess<'de> for Fields<'_> {
    type Error = ProbeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.fields.next() {
            Some(field) => seed.deserialize((*field).into_deserializer()).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        seed.deserialize(self.probe)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

enum ProbeError {
    Unsupported(&'static str),
    Message(String),
}

impl de::Error for ProbeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "unsupported probe shape: {what}"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ProbeError { }

impl fmt::Debug for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// An error when classifying a type's decode shape.
#[derive(Clone, PartialEq)]
pub enum ReflectError {
    /// Decoding requested a shape the probe cannot answer.
    Unsupported(&'static str),
    /// The two sentinel runs observed different structure.
    Divergent,
    /// Decoding itself rejected the probe input.
    Probe(String),
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("arity undeterminable, ")?;
        match self {
            Self::Unsupported(what) => write!(f, "decode requests {what} shape"),
            Self::Divergent => write!(f, "decode structure is input-dependent"),
            Self::Probe(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ReflectError { }

impl fmt::Debug for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
