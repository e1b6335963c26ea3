use bytes::{Buf, BufMut, BytesMut};
use rust_decimal::Decimal;

use crate::{
    Decode, DecodeError, Encode, EncodeError,
    decode::{check_oid, text},
    postgres::{Oid, PgType},
    value::{Format, PgValue},
};

impl PgType for Decimal {
    /// numeric, exact decimal of selectable precision
    const OID: Oid = 1700;
    const ARRAY_OID: Oid = 1231;
}

const SIGN_POS: u16 = 0x0000;
const SIGN_NEG: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;

/// Wire NUMERIC is a base-10000 digit string:
///
/// ```text
/// int16  ndigits
/// int16  weight      // base-10000 exponent of the first digit
/// uint16 sign
/// uint16 dscale      // display scale, cosmetic
/// int16[ndigits]     // digits, each 0..=9999
/// ```
impl Decode for Decimal {
    fn decode(value: PgValue) -> Result<Self, DecodeError> {
        check_oid::<Self>(&value)?;
        let format = value.format();
        let bytes = value.try_into_bytes()?;
        if format == Format::Text {
            return text(Self::OID, &bytes);
        }

        let mut buf = &bytes[..];
        if buf.len() < 8 {
            return Err(DecodeError::Malformed(Self::OID));
        }
        let ndigits = buf.get_i16();
        let weight = buf.get_i16();
        let sign = buf.get_u16();
        let _dscale = buf.get_u16();

        if ndigits < 0 || buf.len() != ndigits as usize * 2 {
            return Err(DecodeError::Malformed(Self::OID));
        }
        match sign {
            SIGN_POS | SIGN_NEG => {},
            // NaN included, Decimal has no NaN
            _ => return Err(DecodeError::Malformed(Self::OID)),
        }

        let mut mantissa: i128 = 0;
        for _ in 0..ndigits {
            let digit = buf.get_i16();
            if !(0..=9999).contains(&digit) {
                return Err(DecodeError::Malformed(Self::OID));
            }
            mantissa = mantissa
                .checked_mul(10_000)
                .and_then(|m| m.checked_add(digit as i128))
                .ok_or(DecodeError::Malformed(Self::OID))?;
        }

        // value = mantissa * 10^(4 * (weight + 1 - ndigits))
        let exp = 4 * (weight as i32 + 1 - ndigits as i32);
        let scale = if exp >= 0 {
            for _ in 0..exp {
                mantissa = mantissa.checked_mul(10).ok_or(DecodeError::Malformed(Self::OID))?;
            }
            0
        } else {
            (-exp) as u32
        };
        if sign == SIGN_NEG {
            mantissa = -mantissa;
        }
        Decimal::try_from_i128_with_scale(mantissa, scale)
            .map_err(|_| DecodeError::Malformed(Self::OID))
    }
}

impl Encode for Decimal {
    fn encode(&self) -> Result<PgValue, EncodeError> {
        let scale = self.scale();
        let mantissa = self.mantissa();
        let sign = match mantissa < 0 {
            true => SIGN_NEG,
            false => SIGN_POS,
        };

        // align the fraction to a base-10000 digit boundary
        let mut m = mantissa.unsigned_abs();
        let pad = (4 - scale % 4) % 4;
        for _ in 0..pad {
            m *= 10; // |mantissa| < 2^96, cannot overflow u128
        }
        let frac_groups = ((scale + pad) / 4) as i32;

        let mut digits = Vec::new();
        while m > 0 {
            digits.push((m % 10_000) as i16);
            m /= 10_000;
        }
        digits.reverse();

        let weight = match digits.is_empty() {
            true => 0,
            false => digits.len() as i32 - frac_groups - 1,
        };

        let mut buf = BytesMut::with_capacity(8 + digits.len() * 2);
        buf.put_i16(digits.len() as i16);
        buf.put_i16(weight as i16);
        buf.put_u16(sign);
        buf.put_u16(scale as u16);
        for digit in digits {
            buf.put_i16(digit);
        }
        Ok(PgValue::binary(Self::OID, buf.freeze()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn roundtrip(s: &str) {
        let decimal = Decimal::from_str(s).unwrap();
        assert_eq!(Decimal::decode(decimal.encode().unwrap()).unwrap(), decimal, "{s}");
    }

    #[test]
    fn binary_roundtrip() {
        roundtrip("0");
        roundtrip("1");
        roundtrip("-1");
        roundtrip("123.45");
        roundtrip("-99.99");
        roundtrip("0.0001");
        roundtrip("12345.6789");
        roundtrip("10000");
        roundtrip("1.0000");
        roundtrip("79228162514264337593543950335"); // Decimal::MAX
    }

    #[test]
    fn text_format() {
        let value = PgValue::text(Decimal::OID, "123.45");
        assert_eq!(Decimal::decode(value).unwrap(), Decimal::from_str("123.45").unwrap());
    }

    #[test]
    fn nan_rejected() {
        let mut buf = BytesMut::new();
        buf.put_i16(0);
        buf.put_i16(0);
        buf.put_u16(SIGN_NAN);
        buf.put_u16(0);

        let value = PgValue::binary(Decimal::OID, buf.freeze());
        assert!(matches!(Decimal::decode(value), Err(DecodeError::Malformed(1700))));
    }

    #[test]
    fn digit_count_missmatch() {
        let mut buf = BytesMut::new();
        buf.put_i16(2); // claims two digits
        buf.put_i16(0);
        buf.put_u16(SIGN_POS);
        buf.put_u16(0);
        buf.put_i16(7);

        let value = PgValue::binary(Decimal::OID, buf.freeze());
        assert!(matches!(Decimal::decode(value), Err(DecodeError::Malformed(1700))));
    }
}
