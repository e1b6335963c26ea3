//! Postgres type catalog constants.
mod pg_type;

pub use pg_type::{Oid, PgType, RegProc};
