//! Postgres wire value marshaling.
//!
//! Converts between tagged, length-prefixed binary wire values and
//! statically typed values, including one dimensional arrays of any
//! supported element type, and classifies the decode shape of arbitrary
//! types without a type metadata facility.
//!
//! # Examples
//!
//! Scalar and array round trip:
//!
//! ```
//! use pgdata::{Decode, Encode};
//!
//! # fn main() -> pgdata::Result<()> {
//! let value = vec!["hello".to_string(), "world".to_string()].encode()?;
//! let back = Vec::<String>::decode(value)?;
//!
//! assert_eq!(back, ["hello", "world"]);
//!
//! // NULL elements survive through `Option`
//! let value = vec![Some(42), None, Some(1337)].encode()?;
//! let back = Vec::<Option<i32>>::decode(value)?;
//!
//! assert_eq!(back, [Some(42), None, Some(1337)]);
//! # Ok(())
//! # }
//! ```
//!
//! Decode shape classification:
//!
//! ```
//! use pgdata::{Arity, classify};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Account {
//!     id: i32,
//!     email: String,
//! }
//!
//! # fn main() -> pgdata::Result<()> {
//! assert_eq!(classify::<i32>()?, Arity::Scalar);
//! assert_eq!(classify::<Account>()?, Arity::Keyed);
//! # Ok(())
//! # }
//! ```

pub mod common;
mod ext;

// Protocol
pub mod postgres;

// Encoding
mod value;
pub mod decode;
pub mod encode;
pub mod array;

// Reflection
pub mod reflect;

// Component
pub mod registry;
pub mod row;

// Integration
pub mod types;

mod error;

pub use value::{Format, PgValue};
pub use decode::{Decode, DecodeError};
pub use encode::{Encode, EncodeError};
pub use reflect::{Arity, ReflectError, classify};
pub use registry::{AnyValue, Codec, Registry};
pub use row::{Column, FromRow, Row};
pub use postgres::{Oid, PgType, RegProc};
pub use error::{Error, ErrorKind, Result};

#[cfg(feature = "json")]
pub use types::Json;
