//! Type integration with external types
//!
//! Implementation [`Decode`][d], [`Encode`][e], and [`PgType`][p] for
//! external types.
//!
//! Available for:
//!
//! - [`serde`]'s [`Deserialize`][sd] and [`Serialize`][ss] via [`Json`], requires `json` feature
//! - [`time`][::time]'s [`PrimitiveDateTime`][tp], [`UtcDateTime`][tu], requires `time` feature
//! - [`uuid`][::uuid]'s [`Uuid`][uu], requires `uuid` feature
//! - [`rust_decimal`]'s [`Decimal`][rd], requires `numeric` feature
//!
//! [d]: crate::Decode
//! [e]: crate::Encode
//! [p]: crate::PgType
//! [sd]: serde::Deserialize
//! [ss]: serde::Serialize
//! [tp]: ::time::PrimitiveDateTime
//! [tu]: ::time::UtcDateTime
//! [uu]: ::uuid::Uuid
//! [rd]: ::rust_decimal::Decimal

#[cfg(feature = "json")]
mod json;
#[cfg(feature = "json")]
pub use json::Json;

#[cfg(feature = "time")]
mod time;

#[cfg(feature = "uuid")]
mod uuid;

#[cfg(feature = "numeric")]
mod numeric;
