use uuid::Uuid;

use crate::{
    Decode, DecodeError, Encode, EncodeError,
    decode::check_oid,
    postgres::{Oid, PgType},
    value::{Format, PgValue},
};

impl PgType for Uuid {
    /// UUID datatype
    const OID: Oid = 2950;
    const ARRAY_OID: Oid = 2951;
}

impl Decode for Uuid {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        match format {
            Format::Binary => Uuid::from_slice(&bytes).map_err(|_| DecodeError::Malformed(Self::OID)),
            Format::Text => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or(DecodeError::Malformed(Self::OID)),
        }
    }
}

impl Encode for Uuid {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        Ok(PgValue::binary(Self::OID, bytes::Bytes::copy_from_slice(self.as_bytes())))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn binary_roundtrip() {
        let id = Uuid::from_u128(0x1f0d1cc0_53cf_11ef_b1b2_3b4e66b2f4d1);
        assert_eq!(Uuid::decode(id.encode().unwrap()).unwrap(), id);
    }

    #[test]
    fn text_format() {
        let id = Uuid::from_u128(7);
        let value = PgValue::text(Uuid::OID, id.to_string());
        assert_eq!(Uuid::decode(value).unwrap(), id);
    }

    #[test]
    fn wrong_width() {
        let value = PgValue::binary(Uuid::OID, bytes::Bytes::copy_from_slice(&[0; 15]));
        assert!(matches!(Uuid::decode(value), Err(DecodeError::Malformed(2950))));
    }
}
