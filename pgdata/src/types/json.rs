use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Decode, DecodeError, Encode, EncodeError,
    postgres::{Oid, PgType},
    value::PgValue,
};

/// Decode and Encode postgres jsonb value.
#[derive(Debug, PartialEq)]
pub struct Json<T>(pub T);

impl<T> PgType for Json<T> {
    /// jsonb, Binary JSON
    const OID: Oid = 3802;
    const ARRAY_OID: Oid = 3807;
}

impl<T> Decode for Json<T>
where
    T: DeserializeOwned,
{
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        crate::decode::check_oid::<Self>(&value)?;
        let bytes = value.try_into_bytes()?;
        // jsonb payload leads with a version byte
        match bytes.split_first() {
            Some((b'\x01', body)) => serde_json::from_slice(body).map_err(Into::into),
            _ => Err(DecodeError::Malformed(Self::OID)),
        }
    }
}

impl<T: Serialize> Encode for Json<T> {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        let body = serde_json::to_vec(&self.0)?;
        let mut buf = BytesMut::with_capacity(body.len() + 1);
        buf.put_u8(b'\x01');
        buf.put(&body[..]);
        Ok(PgValue::binary(Self::OID, buf.freeze()))
    }
}

impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Json<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self(T::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Payload {
        id: i32,
        name: String,
    }

    #[test]
    fn jsonb_roundtrip() {
        let json = Json(Payload { id: 1, name: "Foo".into() });
        let value = json.encode().unwrap();
        assert_eq!(value.oid(), 3802);
        assert_eq!(value.as_slice().unwrap()[0], 1); // version byte

        let back = Json::<Payload>::decode(value).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn missing_version_byte() {
        let value = PgValue::binary(3802, r#"{"id":1}"#);
        let err = Json::<Payload>::decode(value).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(3802)));
    }
}
