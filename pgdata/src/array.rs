//! Array codec over any scalar codec.
//!
//! One dimensional arrays only, the element stream is length-prefixed with
//! every integer big-endian:
//!
//! ```text
//! int32  hasData          // 1 = elements follow, otherwise empty
//! int32  flags            // always 0
//! int32  element oid
//! int32  element count
//! int32  dimensions       // always 1
//! repeat element count times:
//!   int32   length        // -1 = NULL element, no bytes follow
//!   byte[length]
//! ```
//!
//! A whole-array SQL `NULL` is [`DecodeError::NullArray`], it is never
//! silently an empty sequence. `Option` wrapping at the call site decides
//! whether that is acceptable.
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    decode::{Decode, DecodeError},
    encode::{Encode, EncodeError},
    postgres::{Oid, PgType},
    value::{Format, PgValue},
};

/// Element length marking a NULL element, distinct from a present
/// zero-length payload.
pub(crate) const NULL_ELEMENT: i32 = -1;

pub(crate) struct Header {
    pub element_oid: Oid,
    pub count: i32,
}

/// Read the array metadata block.
///
/// Returns [`None`] when `hasData` reports no element stream.
pub(crate) fn read_header(outer_oid: Oid, buf: &mut Bytes) -> Result<Option<Header>, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::Truncated);
    }
    if buf.get_i32() != 1 {
        return Ok(None);
    }
    if buf.remaining() < 16 {
        return Err(DecodeError::Truncated);
    }
    let _flags = buf.get_i32();
    let element_oid = buf.get_u32();
    let count = buf.get_i32();
    let dimensions = buf.get_i32();
    if dimensions != 1 {
        return Err(DecodeError::Malformed(outer_oid));
    }
    if count < 0 {
        return Err(DecodeError::Truncated);
    }
    Ok(Some(Header { element_oid, count }))
}

/// Read one length-prefixed element, wrapped as a value of `oid`.
pub(crate) fn read_element(
    oid: Oid,
    format: Format,
    buf: &mut Bytes,
) -> Result<PgValue, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::Truncated);
    }
    match buf.get_i32() {
        NULL_ELEMENT => Ok(PgValue::null(oid)),
        len if len < 0 => Err(DecodeError::Truncated),
        len => {
            let len = len as usize;
            if buf.remaining() < len {
                return Err(DecodeError::Truncated);
            }
            Ok(PgValue::from_parts(oid, format, Some(buf.split_to(len))))
        },
    }
}

/// Decode an array payload into a sequence of `T`.
///
/// Elements are tagged with the oid declared by the array metadata and keep
/// the outer value's format, element order is preserved.
pub fn decode<T: Decode>(value: PgValue) -> Result<Vec<T>, DecodeError> {
    let oid = value.oid();
    let format = value.format();
    if format == Format::Text {
        return Err(DecodeError::Malformed(oid));
    }
    let mut buf = value.into_bytes().ok_or(DecodeError::NullArray)?;
    let Some(header) = read_header(oid, &mut buf)? else {
        return Ok(Vec::new());
    };
    // a present element takes at least its length prefix
    let cap = (header.count as usize).min(buf.remaining() / 4 + 1);
    let mut elements = Vec::with_capacity(cap);
    for _ in 0..header.count {
        let element = read_element(header.element_oid, format, &mut buf)?;
        elements.push(element.decode()?);
    }
    Ok(elements)
}

/// Encode a sequence of `T` into an array payload.
///
/// An empty sequence still encodes an element stream with zero elements,
/// this design never produces a whole-array `NULL`.
pub fn encode<T: Encode + PgType>(elements: &[T]) -> Result<PgValue, EncodeError> {
    let count =
        i32::try_from(elements.len()).map_err(|_| EncodeError::Unrepresentable(T::ARRAY_OID))?;
    let mut buf = BytesMut::with_capacity(20 + elements.len() * 8);
    buf.put_i32(1); // hasData
    buf.put_i32(0); // flags
    buf.put_u32(T::OID);
    buf.put_i32(count);
    buf.put_i32(1); // dimensions
    for element in elements {
        match element.encode()?.into_bytes() {
            Some(bytes) => {
                let len =
                    i32::try_from(bytes.len()).map_err(|_| EncodeError::Unrepresentable(T::OID))?;
                buf.put_i32(len);
                buf.put(bytes);
            },
            None => buf.put_i32(NULL_ELEMENT),
        }
    }
    Ok(PgValue::binary(T::ARRAY_OID, buf.freeze()))
}

impl<T: Decode + PgType> Decode for Vec<T> {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        if value.oid() != T::ARRAY_OID {
            return Err(DecodeError::OidMismatch { expected: T::ARRAY_OID, got: value.oid() });
        }
        decode(value)
    }
}

impl<T: Encode + PgType> Encode for Vec<T> {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        encode(self)
    }
}

impl<T: Encode + PgType> Encode for [T] {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        encode(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip_strings() {
        let value = vec!["hello".to_string(), "world".to_string()].encode().unwrap();
        assert_eq!(value.oid(), String::ARRAY_OID);

        let back = Vec::<String>::decode(value).unwrap();
        assert_eq!(back, ["hello", "world"]);
    }

    #[test]
    fn order_preserved() {
        let back = Vec::<i32>::decode(vec![1, 2, 3].encode().unwrap()).unwrap();
        assert_eq!(back, [1, 2, 3]);
    }

    #[test]
    fn empty_is_not_null() {
        let value = Vec::<i32>::new().encode().unwrap();
        assert!(!value.is_null());
        assert_eq!(Vec::<i32>::decode(value).unwrap(), []);

        let err = Vec::<i32>::decode(PgValue::null(i32::ARRAY_OID)).unwrap_err();
        assert!(matches!(err, DecodeError::NullArray));
    }

    #[test]
    fn null_element() {
        let value = vec![Some(42), None, Some(1337)].encode().unwrap();
        let back = Vec::<Option<i32>>::decode(value).unwrap();
        assert_eq!(back, [Some(42), None, Some(1337)]);
    }

    #[test]
    fn empty_string_element() {
        let back =
            Vec::<String>::decode(vec![String::new()].encode().unwrap()).unwrap();
        assert_eq!(back, [""]);
    }

    #[test]
    fn no_data_is_empty() {
        let value = PgValue::binary(i32::ARRAY_OID, Bytes::copy_from_slice(&0i32.to_be_bytes()));
        assert_eq!(Vec::<i32>::decode(value).unwrap(), []);
    }

    #[test]
    fn truncated_stream() {
        // header declares 2 elements, only one follows
        let mut buf = BytesMut::new();
        buf.put_i32(1);
        buf.put_i32(0);
        buf.put_u32(i32::OID);
        buf.put_i32(2);
        buf.put_i32(1);
        buf.put_i32(4);
        buf.put_i32(42);

        let err = Vec::<i32>::decode(PgValue::binary(i32::ARRAY_OID, buf.freeze())).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated));
    }

    #[test]
    fn element_length_past_buffer() {
        let mut buf = BytesMut::new();
        buf.put_i32(1);
        buf.put_i32(0);
        buf.put_u32(i32::OID);
        buf.put_i32(1);
        buf.put_i32(1);
        buf.put_i32(400); // element claims 400 bytes
        buf.put_i32(42);

        let err = Vec::<i32>::decode(PgValue::binary(i32::ARRAY_OID, buf.freeze())).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated));
    }

    #[test]
    fn bogus_negative_length() {
        let mut buf = BytesMut::new();
        buf.put_i32(1);
        buf.put_i32(0);
        buf.put_u32(i32::OID);
        buf.put_i32(1);
        buf.put_i32(1);
        buf.put_i32(-2); // not the NULL sentinel

        let err = Vec::<i32>::decode(PgValue::binary(i32::ARRAY_OID, buf.freeze())).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated));
    }

    #[test]
    fn multi_dimension_rejected() {
        let mut buf = BytesMut::new();
        buf.put_i32(1);
        buf.put_i32(0);
        buf.put_u32(i32::OID);
        buf.put_i32(0);
        buf.put_i32(2); // dimensions

        let err = Vec::<i32>::decode(PgValue::binary(i32::ARRAY_OID, buf.freeze())).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(1007)));
    }

    #[test]
    fn wire_bytes_layout() {
        let value = vec![7i32].encode().unwrap();
        let bytes = value.as_slice().unwrap();
        assert_eq!(&bytes[..4], 1i32.to_be_bytes()); // hasData
        assert_eq!(&bytes[4..8], 0i32.to_be_bytes()); // flags
        assert_eq!(&bytes[8..12], i32::OID.to_be_bytes()); // element oid
        assert_eq!(&bytes[12..16], 1i32.to_be_bytes()); // count
        assert_eq!(&bytes[16..20], 1i32.to_be_bytes()); // dimensions
        assert_eq!(&bytes[20..24], 4i32.to_be_bytes()); // element length
        assert_eq!(&bytes[24..], 7i32.to_be_bytes());
    }
}
