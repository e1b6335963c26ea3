use time::{
    Duration, PrimitiveDateTime, UtcDateTime,
    format_description::{BorrowedFormatItem as I, Component as C, modifier},
};

use crate::{
    Decode, DecodeError, Encode, EncodeError,
    decode::{check_oid, fixed},
    postgres::{Oid, PgType},
    value::{Format, PgValue},
};

impl PgType for PrimitiveDateTime {
    /// date and time
    const OID: Oid = 1114;
    const ARRAY_OID: Oid = 1115;
}

impl PgType for UtcDateTime {
    /// date and time with timezone
    const OID: Oid = 1184;
    const ARRAY_OID: Oid = 1185;
}

const PRIMITIVE_PG_EPOCH: PrimitiveDateTime = {
    // source: `from_julian_day` docs
    let date = match time::Date::from_julian_day(2_451_545) {
        Ok(ok) => ok,
        Err(_) => panic!("2000-01-01 is in range"),
    };
    PrimitiveDateTime::new(date, time::Time::MIDNIGHT)
};

const UTC_PG_EPOCH: UtcDateTime = {
    // source: `from_julian_day` docs
    let date = match time::Date::from_julian_day(2_451_545) {
        Ok(ok) => ok,
        Err(_) => panic!("2000-01-01 is in range"),
    };
    UtcDateTime::new(date, time::Time::MIDNIGHT)
};

impl Decode for PrimitiveDateTime {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        match format {
            Format::Binary => {
                let micros = i64::from_be_bytes(fixed(Self::OID, &bytes)?);
                Ok(PRIMITIVE_PG_EPOCH.saturating_add(Duration::microseconds(micros)))
            },
            Format::Text => {
                let s = std::str::from_utf8(&bytes).map_err(|_| DecodeError::Malformed(Self::OID))?;
                PrimitiveDateTime::parse(s, &DESCRIPTION).map_err(|_| DecodeError::Malformed(Self::OID))
            },
        }
    }
}

impl Decode for UtcDateTime {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        match format {
            Format::Binary => {
                let micros = i64::from_be_bytes(fixed(Self::OID, &bytes)?);
                Ok(UTC_PG_EPOCH.saturating_add(Duration::microseconds(micros)))
            },
            Format::Text => {
                let s = std::str::from_utf8(&bytes).map_err(|_| DecodeError::Malformed(Self::OID))?;
                PrimitiveDateTime::parse(s, &DESCRIPTION)
                    .map(PrimitiveDateTime::as_utc)
                    .map_err(|_| DecodeError::Malformed(Self::OID))
            },
        }
    }
}

impl Encode for PrimitiveDateTime {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        let micros = i64::try_from((*self - PRIMITIVE_PG_EPOCH).whole_microseconds())
            .map_err(|_| EncodeError::Unrepresentable(Self::OID))?;
        Ok(PgValue::binary(Self::OID, bytes::Bytes::copy_from_slice(&micros.to_be_bytes())))
    }
}

impl Encode for UtcDateTime {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        let micros = i64::try_from((*self - UTC_PG_EPOCH).whole_microseconds())
            .map_err(|_| EncodeError::Unrepresentable(Self::OID))?;
        Ok(PgValue::binary(Self::OID, bytes::Bytes::copy_from_slice(&micros.to_be_bytes())))
    }
}

// the fraction is omitted for whole seconds
const FRACTION: &[I<'_>] = &[
    I::Literal(b"."),
    I::Component(C::Subsecond(modifier::Subsecond::default())),
];

const DESCRIPTION: &[I<'_>] = &[
    I::Component(C::Year(modifier::Year::default())),
    I::Literal(b"-"),
    I::Component(C::Month(modifier::Month::default())),
    I::Literal(b"-"),
    I::Component(C::Day(modifier::Day::default())),
    I::Literal(b" "),
    I::Component(C::Hour(modifier::Hour::default())),
    I::Literal(b":"),
    I::Component(C::Minute(modifier::Minute::default())),
    I::Literal(b":"),
    I::Component(C::Second(modifier::Second::default())),
    I::Optional(&I::Compound(FRACTION)),
];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn epoch_is_zero() {
        let value = PRIMITIVE_PG_EPOCH.encode().unwrap();
        assert_eq!(value.as_slice().unwrap(), 0i64.to_be_bytes());
    }

    #[test]
    fn binary_roundtrip() {
        let ts = PRIMITIVE_PG_EPOCH.saturating_add(Duration::microseconds(1_234_567));
        assert_eq!(PrimitiveDateTime::decode(ts.encode().unwrap()).unwrap(), ts);

        let ts = UTC_PG_EPOCH.saturating_add(Duration::hours(-48));
        assert_eq!(UtcDateTime::decode(ts.encode().unwrap()).unwrap(), ts);
    }

    #[test]
    fn text_format() {
        let value = PgValue::text(PrimitiveDateTime::OID, "2024-03-01 10:20:30.5");
        let ts = PrimitiveDateTime::decode(value).unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.second(), 30);
    }

    #[test]
    fn text_format_whole_seconds() {
        let value = PgValue::text(PrimitiveDateTime::OID, "2024-03-01 10:20:30");
        let ts = PrimitiveDateTime::decode(value).unwrap();
        assert_eq!(ts.second(), 30);
        assert_eq!(ts.microsecond(), 0);
    }

    #[test]
    fn wrong_width() {
        let value = PgValue::binary(PrimitiveDateTime::OID, bytes::Bytes::copy_from_slice(&[0; 4]));
        assert!(matches!(
            PrimitiveDateTime::decode(value),
            Err(DecodeError::Malformed(1114)),
        ));
    }
}
