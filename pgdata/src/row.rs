//! Named column mapping.
//!
//! - [`Row`]
//! - [`Column`]
//! - [`FromRow`]
//!
//! A transport layer constructs a [`Row`] from the values of one result
//! row, this module maps it onto user types. A derive layer deciding what
//! a `NULL` column means for a nested field type consults
//! [`Row::arity_of`]: a [`Scalar`][Arity::Scalar] field is null, a
//! [`Keyed`][Arity::Keyed] field decodes an empty keyed group.
use serde::de::DeserializeOwned;
use std::borrow::Cow;

use crate::{
    common::ByteStr,
    decode::{Decode, DecodeError},
    postgres::Oid,
    reflect::{Arity, ReflectError, classify},
    value::PgValue,
};

/// One named wire value.
#[derive(Debug, Clone)]
pub struct Column {
    name: ByteStr,
    table: Option<Oid>,
    value: PgValue,
}

impl Column {
    /// Create a column from its name and value.
    pub fn new(name: impl Into<ByteStr>, value: PgValue) -> Self {
        Self { name: name.into(), table: None, value }
    }

    /// Attach the oid of the table this column originates from.
    pub fn with_table(mut self, table: Oid) -> Self {
        self.table = Some(table);
        self
    }

    /// Returns column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the originating table oid, if any.
    pub const fn table(&self) -> Option<Oid> {
        self.table
    }

    /// Returns column value oid.
    pub const fn oid(&self) -> Oid {
        self.value.oid()
    }

    /// Return `true` if value is `NULL`.
    pub const fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Returns the column value.
    pub const fn value(&self) -> &PgValue {
        &self.value
    }

    /// Consume self into the column value.
    pub fn into_value(self) -> PgValue {
        self.value
    }

    /// Try decode type using [`Decode`] implementation.
    pub fn decode<D: Decode>(self) -> Result<D, DecodeError> {
        D::decode(self.value)
    }
}

/// One result row, a mapping from column name to wire value.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: Vec<Column>,
}

impl Row {
    /// Create a row from its columns.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Returns `true` if row contains no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns the columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Try get and decode column.
    ///
    /// A failure identifies the offending column by name.
    pub fn try_get<I: Index, R: Decode>(&self, idx: I) -> Result<R, DecodeError> {
        let column = idx.position(&self.columns)?;
        R::decode(column.value.clone()).map_err(|source| DecodeError::Field {
            column: column.name.clone(),
            source: Box::new(source),
        })
    }

    /// Try decode type using [`FromRow`] implementation.
    pub fn decode<D: FromRow>(self) -> Result<D, DecodeError> {
        D::from_row(self)
    }

    /// Decode shape of a field type, for `NULL` column policy.
    pub fn arity_of<T: DeserializeOwned + 'static>() -> Result<Arity, ReflectError> {
        classify::<T>()
    }
}

impl FromIterator<Column> for Row {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        Self { columns: iter.into_iter().collect() }
    }
}

impl IntoIterator for Row {
    type Item = Column;

    type IntoIter = std::vec::IntoIter<Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

// ===== Traits =====

/// Type that can be constructed from a row.
pub trait FromRow: Sized {
    /// Construct self from row.
    fn from_row(row: Row) -> Result<Self, DecodeError>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self, DecodeError> {
        Ok(row)
    }
}

impl FromRow for () {
    fn from_row(_: Row) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! from_row_tuple {
    ($($t:ident $i:literal),*) => {
        impl<$($t),*> FromRow for ($($t),*,)
        where
            $($t: Decode),*
        {
            fn from_row(row: Row) -> Result<Self, DecodeError> {
                Ok((
                    $(row.try_get($i)?),*,
                ))
            }
        }
    };
}

from_row_tuple!(T0 0);
from_row_tuple!(T0 0, T1 1);
from_row_tuple!(T0 0, T1 1, T2 2);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3);

/// Type that can be used for indexing column.
pub trait Index: Sized + sealed::Sealed {
    /// Find the column this index names.
    fn position(self, columns: &[Column]) -> Result<&Column, DecodeError>;
}

impl Index for usize {
    fn position(self, columns: &[Column]) -> Result<&Column, DecodeError> {
        columns.get(self).ok_or(DecodeError::IndexOutOfBounds(self))
    }
}

impl Index for &str {
    fn position(self, columns: &[Column]) -> Result<&Column, DecodeError> {
        columns
            .iter()
            .find(|col| col.name == self)
            .ok_or_else(|| DecodeError::ColumnNotFound(Cow::Owned(String::from(self))))
    }
}

mod sealed {
    pub trait Sealed { }
    impl Sealed for usize { }
    impl Sealed for &str { }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Encode, postgres::PgType};

    fn row() -> Row {
        Row::from_columns(vec![
            Column::new("id", 420i32.encode().unwrap()).with_table(16384),
            Column::new("email", "foo@bar.com".encode().unwrap()).with_table(16384),
            Column::new("deleted_at", PgValue::null(i64::OID)),
        ])
    }

    #[test]
    fn get_by_name_and_index() {
        let row = row();
        assert_eq!(row.try_get::<_, i32>("id").unwrap(), 420);
        assert_eq!(row.try_get::<_, i32>(0).unwrap(), 420);
        assert_eq!(row.try_get::<_, String>("email").unwrap(), "foo@bar.com");
        assert_eq!(row.try_get::<_, Option<i64>>("deleted_at").unwrap(), None);
    }

    #[test]
    fn tuple_from_row() {
        let (id, email) = row().decode::<(i32, String)>().unwrap();
        assert_eq!(id, 420);
        assert_eq!(email, "foo@bar.com");
    }

    #[test]
    fn missing_column() {
        let err = row().try_get::<_, i32>("nope").unwrap_err();
        assert!(matches!(err, DecodeError::ColumnNotFound(_)));

        let err = row().try_get::<_, i32>(9).unwrap_err();
        assert!(matches!(err, DecodeError::IndexOutOfBounds(9)));
    }

    #[test]
    fn failure_names_the_column() {
        let err = row().try_get::<_, i64>("deleted_at").unwrap_err();
        let DecodeError::Field { column, source } = err else {
            panic!("expected field error")
        };
        assert_eq!(column, "deleted_at");
        assert!(matches!(*source, DecodeError::Null));
    }

    #[test]
    fn null_policy_by_arity() {
        #[derive(serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            street: String,
            #[allow(dead_code)]
            city: String,
        }

        assert_eq!(Row::arity_of::<i64>().unwrap(), Arity::Scalar);
        assert_eq!(Row::arity_of::<Address>().unwrap(), Arity::Keyed);
    }
}
