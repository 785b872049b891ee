//! PostgreSQL store on top of `sqlx`.
//!
//! Statements are assembled with [`sqlx::QueryBuilder`] from the table description.
//! Identifiers only ever come from the static schema (query column names are checked
//! against it first); every value is a bound parameter.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres, QueryBuilder, Row as _,
};

use super::query::{Direction, Filter, Query};
use super::schema::{Column, ColumnType, Table};
use super::{NewRow, Row, Store, Value};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, column: &Column, value: &Value) {
    match value {
        Value::Integer(v) => builder.push_bind(*v),
        Value::Text(v) => builder.push_bind(v.clone()),
        Value::Date(v) => builder.push_bind(*v),
        Value::Bool(v) => builder.push_bind(*v),
        Value::Null => match column.ty {
            ColumnType::Serial => builder.push_bind(None::<i32>),
            ColumnType::VarChar(_) | ColumnType::Text => builder.push_bind(None::<String>),
            ColumnType::Date => builder.push_bind(None::<NaiveDate>),
            ColumnType::Boolean => builder.push_bind(None::<bool>),
        },
    };
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, table: &Table, filter: &Filter) {
    match filter {
        Filter::All => {
            builder.push("TRUE");
        }
        Filter::Eq(name, Value::Null) => {
            builder.push(format!("{} IS NULL", name));
        }
        Filter::Eq(name, value) => {
            builder.push(format!("{} = ", name));
            if let Some(column) = table.column(name) {
                push_value(builder, column, value);
            }
        }
        Filter::And(filters) | Filter::Or(filters) if filters.is_empty() => {
            builder.push(if matches!(filter, Filter::And(_)) { "TRUE" } else { "FALSE" });
        }
        Filter::And(filters) | Filter::Or(filters) => {
            let joiner = if matches!(filter, Filter::And(_)) { " AND " } else { " OR " };
            builder.push("(");
            for (idx, inner) in filters.iter().enumerate() {
                if idx > 0 {
                    builder.push(joiner);
                }
                push_filter(builder, table, inner);
            }
            builder.push(")");
        }
    }
}

fn push_order(builder: &mut QueryBuilder<'_, Postgres>, table: &Table, query: &Query) {
    for (idx, order) in query.order.iter().enumerate() {
        builder.push(if idx == 0 { " ORDER BY " } else { ", " });
        match table.column(order.column).and_then(|column| column.scale) {
            Some(scale) => {
                let labels: Vec<String> = scale.iter().map(|label| label.to_string()).collect();
                builder.push("COALESCE(array_position(");
                builder.push_bind(labels);
                builder.push(format!("::text[], {}::text), 0)", order.column));
            }
            None => {
                builder.push(order.column);
            }
        }
        builder.push(match order.direction {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        });
    }
}

fn select_sql<'a>(table: &Table, query: &Query) -> QueryBuilder<'a, Postgres> {
    let columns: Vec<&str> = table.column_names().collect();
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM {} WHERE ", columns.join(", "), table.name));
    push_filter(&mut builder, table, &query.filter);
    push_order(&mut builder, table, query);
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    builder
}

fn count_sql<'a>(table: &Table, filter: &Filter) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE ", table.name));
    push_filter(&mut builder, table, filter);
    builder
}

/// One multi-row `INSERT`. Columns come from the table, so rows that leave a column out
/// get `DEFAULT` for it.
fn insert_sql<'a>(table: &Table, rows: &[NewRow]) -> Result<QueryBuilder<'a, Postgres>, AppError> {
    for (name, _) in rows.iter().flatten() {
        if table.column(name).is_none() {
            return Err(AppError::InternalServerError(format!(
                "column {:?} does not exist on table {:?}",
                name, table.name
            )));
        }
    }

    let targets: Vec<&Column> = table
        .columns
        .iter()
        .filter(|column| {
            !column.is_generated()
                || rows
                    .iter()
                    .any(|row| row.iter().any(|(name, _)| *name == column.name))
        })
        .collect();
    let names: Vec<&str> = targets.iter().map(|column| column.name).collect();
    let returning: Vec<&str> = table.column_names().collect();

    let mut builder = QueryBuilder::new(format!("INSERT INTO {} ({}) VALUES ", table.name, names.join(", ")));
    for (row_idx, row) in rows.iter().enumerate() {
        builder.push(if row_idx == 0 { "(" } else { ", (" });
        for (col_idx, column) in targets.iter().enumerate() {
            if col_idx > 0 {
                builder.push(", ");
            }
            match row.iter().find(|(name, _)| *name == column.name) {
                Some((_, value)) => push_value(&mut builder, column, value),
                None => {
                    builder.push("DEFAULT");
                }
            }
        }
        builder.push(")");
    }
    builder.push(format!(" RETURNING {}", returning.join(", ")));
    Ok(builder)
}

fn decode_row(table: &'static Table, row: &PgRow) -> Result<Row, AppError> {
    let mut values = Vec::with_capacity(table.columns.len());
    for column in table.columns {
        let value: Value = match column.ty {
            ColumnType::Serial => row.try_get::<Option<i32>, _>(column.name)?.into(),
            ColumnType::VarChar(_) | ColumnType::Text => {
                row.try_get::<Option<String>, _>(column.name)?.into()
            }
            ColumnType::Date => row.try_get::<Option<NaiveDate>, _>(column.name)?.into(),
            ColumnType::Boolean => row.try_get::<Option<bool>, _>(column.name)?.into(),
        };
        values.push(value);
    }
    Ok(Row::new(table, values))
}

#[async_trait]
impl Store for PgStore {
    async fn create_tables(&self, tables: &[&'static Table]) -> Result<(), AppError> {
        for table in tables {
            let sql = table.create_sql();
            log::debug!("{}", sql);
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn drop_tables(&self, tables: &[&'static Table]) -> Result<(), AppError> {
        for table in tables.iter().rev() {
            let sql = table.drop_sql();
            log::debug!("{}", sql);
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn insert(&self, table: &'static Table, rows: Vec<NewRow>) -> Result<Vec<Row>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = insert_sql(table, &rows)?;
        log::debug!("{}", builder.sql());
        let stored = builder.build().fetch_all(&self.pool).await?;
        stored.iter().map(|row| decode_row(table, row)).collect()
    }

    async fn select(&self, table: &'static Table, query: &Query) -> Result<Vec<Row>, AppError> {
        query.check(table)?;
        let mut builder = select_sql(table, query);
        log::debug!("{}", builder.sql());
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(|row| decode_row(table, row)).collect()
    }

    async fn count(&self, table: &'static Table, filter: &Filter) -> Result<i64, AppError> {
        filter.check(table)?;
        let mut builder = count_sql(table, filter);
        log::debug!("{}", builder.sql());
        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }
}
