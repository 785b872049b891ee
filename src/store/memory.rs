//! In-process store.
//!
//! Evaluates the same [`Query`] values as [`super::PgStore`] against rows kept in memory.
//! Selected with `DATABASE_URL=memory://`, and used by the test suite.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::query::{Filter, Query};
use super::schema::{ColumnType, Table};
use super::{NewRow, Row, Store, Value};
use crate::error::AppError;

#[derive(Debug, Default)]
struct TableData {
    next_id: i32,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, TableData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::InternalServerError("memory store lock poisoned".into())
}

fn missing_table(table: &Table) -> AppError {
    AppError::DatabaseError(format!("relation \"{}\" does not exist", table.name))
}

/// Builds a full row from assignments, applying generated ids, defaults and column
/// constraints. `next_id` is only advanced on success.
fn materialize(table: &'static Table, new: NewRow, next_id: &mut i32) -> Result<Row, AppError> {
    for (name, _) in &new {
        if table.column(name).is_none() {
            return Err(AppError::DatabaseError(format!(
                "column \"{}\" of relation \"{}\" does not exist",
                name, table.name
            )));
        }
    }

    let mut values = Vec::with_capacity(table.columns.len());
    for column in table.columns {
        let assigned = new
            .iter()
            .find(|(name, _)| *name == column.name)
            .map(|(_, value)| value.clone());

        let value = match (column.ty, assigned) {
            (ColumnType::Serial, Some(value)) => value,
            (ColumnType::Serial, None) => {
                *next_id += 1;
                Value::Integer(*next_id)
            }
            (_, Some(value)) => value,
            (_, None) => column.default.map_or(Value::Null, |default| default.to_value()),
        };

        if value.is_null() && !column.nullable {
            return Err(AppError::DatabaseError(format!(
                "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                column.name, table.name
            )));
        }
        if let (ColumnType::VarChar(Some(max)), Value::Text(text)) = (column.ty, &value) {
            if text.chars().count() > max as usize {
                return Err(AppError::DatabaseError(format!(
                    "value too long for type character varying({})",
                    max
                )));
            }
        }
        values.push(value);
    }
    Ok(Row::new(table, values))
}

fn unique_violation(table: &Table, existing: &[Row], candidate: &Row) -> Option<AppError> {
    table
        .columns
        .iter()
        .filter(|column| column.unique)
        .find_map(|column| {
            let value = candidate.get(column.name)?;
            if value.is_null() {
                return None;
            }
            existing
                .iter()
                .any(|row| row.get(column.name) == Some(value))
                .then(|| {
                    AppError::Conflict(format!(
                        "duplicate key value violates unique constraint \"{}_{}_key\"",
                        table.name, column.name
                    ))
                })
        })
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_tables(&self, tables: &[&'static Table]) -> Result<(), AppError> {
        let mut data = self.tables.write().map_err(poisoned)?;
        for table in tables {
            data.entry(table.name).or_default();
            log::debug!("memory store: table {} ready", table.name);
        }
        Ok(())
    }

    async fn drop_tables(&self, tables: &[&'static Table]) -> Result<(), AppError> {
        let mut data = self.tables.write().map_err(poisoned)?;
        for table in tables {
            data.remove(table.name);
            log::debug!("memory store: table {} dropped", table.name);
        }
        Ok(())
    }

    async fn insert(&self, table: &'static Table, rows: Vec<NewRow>) -> Result<Vec<Row>, AppError> {
        let mut data = self.tables.write().map_err(poisoned)?;
        let stored = data.get_mut(table.name).ok_or_else(|| missing_table(table))?;

        let mut next_id = stored.next_id;
        let mut inserted: Vec<Row> = Vec::with_capacity(rows.len());
        for new in rows {
            let row = materialize(table, new, &mut next_id)?;
            if let Some(err) = unique_violation(table, &stored.rows, &row)
                .or_else(|| unique_violation(table, &inserted, &row))
            {
                return Err(err);
            }
            inserted.push(row);
        }

        stored.next_id = next_id;
        stored.rows.extend(inserted.iter().cloned());
        log::debug!("memory store: inserted {} row(s) into {}", inserted.len(), table.name);
        Ok(inserted)
    }

    async fn select(&self, table: &'static Table, query: &Query) -> Result<Vec<Row>, AppError> {
        query.check(table)?;
        let data = self.tables.read().map_err(poisoned)?;
        let stored = data.get(table.name).ok_or_else(|| missing_table(table))?;

        let mut rows: Vec<Row> = stored
            .rows
            .iter()
            .filter(|row| query.filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| query.compare(table, a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows)
    }

    async fn count(&self, table: &'static Table, filter: &Filter) -> Result<i64, AppError> {
        filter.check(table)?;
        let data = self.tables.read().map_err(poisoned)?;
        let stored = data.get(table.name).ok_or_else(|| missing_table(table))?;

        Ok(stored.rows.iter().filter(|row| filter.matches(row)).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::query::Direction;
    use crate::store::schema::Column;
    use pretty_assertions::assert_eq;

    static ACCOUNTS: Table = Table {
        name: "accounts",
        columns: &[
            Column::serial("id"),
            Column::new("handle", ColumnType::VarChar(Some(8))).unique(),
            Column::new("nickname", ColumnType::Text).nullable(),
            Column::new("active", ColumnType::Boolean).default_bool(true),
        ],
    };

    fn account(handle: &str) -> NewRow {
        vec![("handle", Value::from(handle))]
    }

    async fn ready_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_tables(&[&ACCOUNTS]).await.unwrap();
        store
    }

    #[actix_rt::test]
    async fn test_insert_fills_generated_and_default_columns() {
        let store = ready_store().await;
        let rows = store
            .insert(&ACCOUNTS, vec![account("ann"), account("bob")])
            .await
            .unwrap();

        assert_eq!(rows[0].values(), &[Value::Integer(1), "ann".into(), Value::Null, Value::Bool(true)]);
        assert_eq!(rows[1].integer("id").unwrap(), 2);
    }

    #[actix_rt::test]
    async fn test_bulk_insert_is_all_or_nothing() {
        let store = ready_store().await;
        store.insert(&ACCOUNTS, vec![account("ann")]).await.unwrap();

        let result = store
            .insert(&ACCOUNTS, vec![account("cat"), account("ann")])
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(store.count(&ACCOUNTS, &Filter::All).await.unwrap(), 1);

        let dup_in_batch = store
            .insert(&ACCOUNTS, vec![account("dan"), account("dan")])
            .await;
        assert!(matches!(dup_in_batch, Err(AppError::Conflict(_))));

        // ids are not consumed by failed inserts
        let rows = store.insert(&ACCOUNTS, vec![account("eve")]).await.unwrap();
        assert_eq!(rows[0].integer("id").unwrap(), 2);
    }

    #[actix_rt::test]
    async fn test_constraints() {
        let store = ready_store().await;

        let missing = store.insert(&ACCOUNTS, vec![vec![]]).await;
        assert!(matches!(missing, Err(AppError::DatabaseError(_))));

        let too_long = store.insert(&ACCOUNTS, vec![account("much-too-long")]).await;
        assert!(matches!(too_long, Err(AppError::DatabaseError(_))));

        let unknown = store
            .insert(&ACCOUNTS, vec![vec![("handle", "x".into()), ("email", "x".into())]])
            .await;
        assert!(matches!(unknown, Err(AppError::DatabaseError(_))));
    }

    #[actix_rt::test]
    async fn test_select_filters_orders_and_limits() {
        let store = ready_store().await;
        store
            .insert(
                &ACCOUNTS,
                vec![
                    account("carol"),
                    vec![("handle", "al".into()), ("active", false.into())],
                    vec![("handle", "bea".into()), ("nickname", "B".into())],
                ],
            )
            .await
            .unwrap();

        let query = Query::new()
            .filter(Filter::eq("active", true))
            .order_by("handle", Direction::Asc);
        let handles: Vec<String> = store
            .select(&ACCOUNTS, &query)
            .await
            .unwrap()
            .iter()
            .map(|row| row.text("handle").unwrap())
            .collect();
        assert_eq!(handles, vec!["bea", "carol"]);

        let limited = store
            .select(&ACCOUNTS, &Query::new().order_by("id", Direction::Desc).limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].text("handle").unwrap(), "bea");

        let unnamed = store
            .count(&ACCOUNTS, &Filter::eq("nickname", Value::Null))
            .await
            .unwrap();
        assert_eq!(unnamed, 2);
    }

    #[actix_rt::test]
    async fn test_dropped_tables_are_gone() {
        let store = ready_store().await;
        store.insert(&ACCOUNTS, vec![account("ann")]).await.unwrap();
        store.drop_tables(&[&ACCOUNTS]).await.unwrap();

        let result = store.select(&ACCOUNTS, &Query::new()).await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));

        store.create_tables(&[&ACCOUNTS]).await.unwrap();
        assert_eq!(store.count(&ACCOUNTS, &Filter::All).await.unwrap(), 0);
    }
}
