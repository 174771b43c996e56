use crate::{AsValue, Driver, ErrorKind, Identifier, Result, Value, truncate_long};
use anyhow::Context;
use std::{
    collections::BTreeSet,
    fmt::{self, Display},
    sync::Arc,
};

/// A query ready to be executed by an [`Executor`](crate::Executor).
///
/// Either raw SQL text or a statement the backend already prepared.
#[derive(Debug)]
pub enum Query<'a, D: Driver> {
    /// Unprepared SQL text.
    Raw(String),
    /// Driver prepared handle, parameters already bound.
    Prepared(&'a mut D::Prepared),
}

impl<D: Driver> Display for Query<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Raw(query) => write!(f, "{}", truncate_long!(query)),
            Query::Prepared(query) => query.fmt(f),
        }
    }
}

impl<D: Driver> From<String> for Query<'_, D> {
    fn from(value: String) -> Self {
        Query::Raw(value)
    }
}

impl<D: Driver> From<&str> for Query<'_, D> {
    fn from(value: &str) -> Self {
        Query::Raw(value.into())
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Last inserted row id when available.
    pub last_affected_id: Option<i64>,
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
}

/// Heterogeneous items emitted by `Executor::run` combining rows and modify results.
#[derive(Debug)]
pub enum QueryResult {
    /// A labeled row.
    Row(RowLabeled),
    /// A modify effect aggregation.
    Affected(RowsAffected),
}

/// Published by a connection every time a transaction commits.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    /// Tables written by the transaction. Empty when unknown (e.g. schema changes).
    pub tables: BTreeSet<Identifier>,
}

impl CommitEvent {
    /// Whether a query reading `tables` may observe the changes of this commit.
    pub fn touches(&self, tables: &BTreeSet<Identifier>) -> bool {
        self.tables.is_empty() || tables.is_empty() || !self.tables.is_disjoint(tables)
    }
}

/// Sequential reader over the values of a result row.
///
/// Projections consume the columns they produced, in the same order.
pub struct RowDecoder<'a> {
    values: &'a mut [Value],
    position: usize,
}

impl<'a> RowDecoder<'a> {
    pub fn new(values: &'a mut [Value]) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Takes the next value out of the row.
    pub fn next_value(&mut self) -> Result<Value> {
        let Some(value) = self.values.get_mut(self.position) else {
            return Err(ErrorKind::Decode.error(format!(
                "Row has {} columns, tried to read column {}",
                self.values.len(),
                self.position
            )));
        };
        self.position += 1;
        Ok(std::mem::take(value))
    }

    pub fn decode<T: AsValue>(&mut self) -> Result<T> {
        let position = self.position;
        let value = self.next_value()?;
        T::try_from_value(value).with_context(|| format!("While decoding column {}", position))
    }

    /// Whether the next `count` values are all NULL.
    pub fn peek_all_null(&self, count: usize) -> bool {
        self.values
            .iter()
            .skip(self.position)
            .take(count)
            .all(Value::is_null)
    }

    pub fn skip(&mut self, count: usize) {
        self.position = (self.position + count).min(self.values.len());
    }
}

#[cfg(test)]
mod tests {
    use super::{CommitEvent, RowDecoder};
    use crate::{ErrorKind, Identifier, Value};
    use std::collections::BTreeSet;

    #[test]
    fn decoder_reads_in_order() {
        let mut values = vec![Value::Integer(1), Value::Null, Value::Text("x".into())];
        let mut row = RowDecoder::new(&mut values);
        assert_eq!(row.decode::<i64>().unwrap(), 1);
        assert!(row.peek_all_null(1));
        assert_eq!(row.decode::<Option<String>>().unwrap(), None);
        assert_eq!(row.decode::<String>().unwrap(), "x");
        let error = row.decode::<i64>().unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Decode));
    }

    #[test]
    fn commit_touches() {
        let tables = |names: &[&str]| -> BTreeSet<Identifier> {
            names.iter().map(|v| Identifier::new(v).unwrap()).collect()
        };
        let event = CommitEvent {
            tables: tables(&["person"]),
        };
        assert!(event.touches(&tables(&["person", "pet"])));
        assert!(!event.touches(&tables(&["pet"])));
        assert!(CommitEvent::default().touches(&tables(&["pet"])));
    }
}
