//! Persistence layer.
//!
//! Records describe themselves through a static [`schema::Table`] and convert to and
//! from [`Row`]s of dynamic [`Value`]s. A [`Store`] backend only ever sees tables, rows
//! and [`query::Query`] values; the generic functions at the bottom of this module
//! (`insert`, `insert_all`, `fetch`, `fetch_first`, `count`) give callers typed records.

pub mod memory;
pub mod postgres;
pub mod query;
pub mod schema;

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;
use query::{Filter, Query};
use schema::Table;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i32),
    Text(String),
    Date(NaiveDate),
    Bool(bool),
}

impl Value {
    /// Total order used for sorting; `Null` sorts after every other value.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// One stored row: values in the column order of its table.
#[derive(Debug, Clone)]
pub struct Row {
    table: &'static Table,
    values: Vec<Value>,
}

impl Row {
    pub fn new(table: &'static Table, values: Vec<Value>) -> Self {
        Self { table, values }
    }

    pub fn table(&self) -> &'static Table {
        self.table
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.table
            .position(column)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn require(&self, column: &str) -> Result<&Value, AppError> {
        self.get(column).ok_or_else(|| {
            AppError::DatabaseError(format!(
                "column {:?} missing from {} row",
                column, self.table.name
            ))
        })
    }

    fn mismatch(&self, column: &str, expected: &str, found: &Value) -> AppError {
        AppError::DatabaseError(format!(
            "{}.{}: expected {}, found {:?}",
            self.table.name, column, expected, found
        ))
    }

    pub fn integer(&self, column: &str) -> Result<i32, AppError> {
        match self.require(column)? {
            Value::Integer(value) => Ok(*value),
            other => Err(self.mismatch(column, "integer", other)),
        }
    }

    pub fn text(&self, column: &str) -> Result<String, AppError> {
        match self.require(column)? {
            Value::Text(value) => Ok(value.clone()),
            other => Err(self.mismatch(column, "text", other)),
        }
    }

    pub fn optional_text(&self, column: &str) -> Result<Option<String>, AppError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Text(value) => Ok(Some(value.clone())),
            other => Err(self.mismatch(column, "text or null", other)),
        }
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate, AppError> {
        match self.require(column)? {
            Value::Date(value) => Ok(*value),
            other => Err(self.mismatch(column, "date", other)),
        }
    }

    pub fn boolean(&self, column: &str) -> Result<bool, AppError> {
        match self.require(column)? {
            Value::Bool(value) => Ok(*value),
            other => Err(self.mismatch(column, "boolean", other)),
        }
    }
}

/// Column assignments for one insert; columns left out get their default.
pub type NewRow = Vec<(&'static str, Value)>;

/// A persisted entity mapped onto a table.
pub trait Record: Sized {
    fn table() -> &'static Table;
    fn from_row(row: &Row) -> Result<Self, AppError>;
    fn to_row(&self) -> Row;
}

/// Data for a record that has not been stored yet.
pub trait Insertable {
    type Record: Record;
    fn assignments(&self) -> NewRow;
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Creates the tables that do not exist yet.
    async fn create_tables(&self, tables: &[&'static Table]) -> Result<(), AppError>;

    /// Drops the tables that exist, with all their rows.
    async fn drop_tables(&self, tables: &[&'static Table]) -> Result<(), AppError>;

    /// Inserts all rows or none, returning them as stored (generated ids filled in).
    async fn insert(&self, table: &'static Table, rows: Vec<NewRow>) -> Result<Vec<Row>, AppError>;

    async fn select(&self, table: &'static Table, query: &Query) -> Result<Vec<Row>, AppError>;

    async fn count(&self, table: &'static Table, filter: &Filter) -> Result<i64, AppError>;
}

pub async fn insert<N: Insertable>(store: &dyn Store, new: &N) -> Result<N::Record, AppError> {
    insert_all(store, std::slice::from_ref(new))
        .await?
        .pop()
        .ok_or_else(|| AppError::DatabaseError("insert returned no row".into()))
}

pub async fn insert_all<N: Insertable>(
    store: &dyn Store,
    new: &[N],
) -> Result<Vec<N::Record>, AppError> {
    let rows = new.iter().map(Insertable::assignments).collect();
    store
        .insert(<N::Record as Record>::table(), rows)
        .await?
        .iter()
        .map(<N::Record as Record>::from_row)
        .collect()
}

pub async fn fetch<R: Record>(store: &dyn Store, query: &Query) -> Result<Vec<R>, AppError> {
    store
        .select(R::table(), query)
        .await?
        .iter()
        .map(R::from_row)
        .collect()
}

pub async fn fetch_first<R: Record>(store: &dyn Store, query: Query) -> Result<Option<R>, AppError> {
    Ok(fetch(store, &query.limit(1)).await?.into_iter().next())
}

pub async fn count<R: Record>(store: &dyn Store, filter: &Filter) -> Result<i64, AppError> {
    store.count(R::table(), filter).await
}
