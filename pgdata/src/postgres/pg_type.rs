/// Postgres object identifier.
///
/// The oid type is implemented as an unsigned four-byte integer.
///
/// <https://www.postgresql.org/docs/current/datatype-oid.html>
pub type Oid = u32;

/// A type that have corresponding postgres oid.
///
/// Every scalar type carries two identities: its own oid and the oid of
/// "array of this type", so the array codec can tag both directions.
pub trait PgType {
    const OID: Oid;
    const ARRAY_OID: Oid;
}

/// An oid handle naming a function in the catalog.
///
/// `regproc` is stored on the wire as a bare oid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RegProc(pub Oid);

macro_rules! oid {
    ($ty:ty, $oid:literal, $array:literal $(, $doc:literal)? ) => {
        impl PgType for $ty {
            $(#[doc = $doc])?
            const OID: Oid = $oid;
            const ARRAY_OID: Oid = $array;
        }
    };
}

oid!(bool, 16, 1000);
oid!(i8, 18, 1002, "`\"char\"` single byte");
oid!(u8, 18, 1002, "`\"char\"` single byte");
oid!(char, 18, 1002, "`\"char\"` single byte");
oid!(i64, 20, 1016, "`int8` ~18 digit integer, 8-byte storage");
oid!(u64, 20, 1016, "`int8` ~18 digit integer, 8-byte storage");
oid!(i16, 21, 1005, "`int2` -32 thousand to 32 thousand, 2-byte storage");
oid!(u16, 21, 1005, "`int2` -32 thousand to 32 thousand, 2-byte storage");
oid!(i32, 23, 1007, "`int4` -2 billion to 2 billion integer, 4-byte storage");
oid!(u32, 23, 1007, "`int4` -2 billion to 2 billion integer, 4-byte storage");
oid!(str, 25, 1009, "`text` variable-length string, no limit specified");
oid!(String, 25, 1009, "`text` variable-length string, no limit specified");
oid!(f32, 700, 1021, "`float4` single-precision floating point number, 4-byte storage");
oid!(f64, 701, 1022, "`float8` double-precision floating point number, 8-byte storage");
oid!(bytes::Bytes, 17, 1001, "`bytea` variable-length binary string");
oid!(RegProc, 24, 1008, "`regproc` registered procedure");

impl<T: PgType> PgType for Option<T> {
    const OID: Oid = T::OID;
    const ARRAY_OID: Oid = T::ARRAY_OID;
}

impl<T: PgType + ?Sized> PgType for &T {
    const OID: Oid = T::OID;
    const ARRAY_OID: Oid = T::ARRAY_OID;
}
