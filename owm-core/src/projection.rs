//! Projected collections: tables extracted from lists of uniformly-shaped records.
//!
//! ```rust
//! use owm_core::projection::Collection;
//! use serde_json::json;
//!
//! let people = Collection::new(vec![
//!     json!({"name": "Peter", "nick": "p", "more": {"phone": 888}}),
//!     json!({"name": "Jane", "nick": "j", "more": {"phone": 777}}),
//! ]);
//!
//! let rows = people.select(&["nick", "more/phone"]).unwrap();
//! assert_eq!(rows, vec![vec![json!("p"), json!(888)], vec![json!("j"), json!(777)]]);
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    convert::Converters,
    path::{Path, PathError, kind, parse_all},
    record::{KeyStyle, ProjectionError, Record, output_keys},
};

/// Raised when a response does not have the shape a helper expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("expected a JSON array, found {found}")]
    NotAnArray { found: &'static str },

    #[error("field '{field}' is missing")]
    MissingField { field: String },

    #[error("field '{field}' should be an array, found {found}")]
    NotASequence { field: String, found: &'static str },
}

pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            records: values.into_iter().map(Record::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn select<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<Row>, PathError> {
        self.select_with(paths, &Converters::default())
    }

    /// One row per record, in record order. Any failing record fails the call.
    pub fn select_with<S: AsRef<str>>(
        &self,
        paths: &[S],
        converters: &Converters,
    ) -> Result<Vec<Row>, PathError> {
        let paths = parse_all(paths)?;
        self.records.iter().map(|r| r.row(&paths, converters)).collect()
    }

    /// Lazy variant of `select_with`: one result per record.
    ///
    /// Paths are parsed before iteration starts; a malformed path fails here
    /// rather than on every row.
    pub fn select_iter<'a, S: AsRef<str>>(
        &'a self,
        paths: &[S],
        converters: &'a Converters,
    ) -> Result<impl Iterator<Item = Result<Row, PathError>> + use<'a, S>, PathError> {
        let paths = parse_all(paths)?;
        Ok(self.records.iter().map(move |r| r.row(&paths, converters)))
    }

    pub fn select_as_mappings<S: AsRef<str>>(
        &self,
        paths: &[S],
        style: KeyStyle,
        converters: &Converters,
    ) -> Result<Vec<Map<String, Value>>, ProjectionError> {
        let paths: Vec<Path> = parse_all(paths)?;
        let keys = output_keys(&paths, style)?;

        self.records
            .iter()
            .map(|r| -> Result<Map<String, Value>, ProjectionError> {
                let row = r.row(&paths, converters)?;
                Ok(keys.iter().cloned().zip(row).collect())
            })
            .collect()
    }
}

impl TryFrom<Value> for Collection {
    type Error = ShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => Ok(Self::new(items)),
            other => Err(ShapeError::NotAnArray {
                found: kind(&other),
            }),
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
