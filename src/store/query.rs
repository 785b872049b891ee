use std::cmp::Ordering;

use super::{schema::Table, Row, Value};
use crate::error::AppError;

/// Row predicate: equality on columns combined with conjunction and disjunction.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every row.
    All,
    /// `column = value`; against `Value::Null` this means "is null".
    Eq(&'static str, Value),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Filter::Eq(column, value.into())
    }

    /// Conjunction; nested `And`s are flattened.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, other) => other,
            (this, Filter::All) => this,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                left.push(other);
                Filter::And(left)
            }
            (this, other) => Filter::And(vec![this, other]),
        }
    }

    /// Disjunction; nested `Or`s are flattened.
    pub fn or(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, _) | (_, Filter::All) => Filter::All,
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), other) => {
                left.push(other);
                Filter::Or(left)
            }
            (this, other) => Filter::Or(vec![this, other]),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(column, expected) => row.get(column).map_or(false, |actual| actual == expected),
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(row)),
            Filter::Or(filters) => filters.iter().any(|filter| filter.matches(row)),
        }
    }

    /// Fails if the filter names a column the table does not have.
    pub fn check(&self, table: &Table) -> Result<(), AppError> {
        match self {
            Filter::All => Ok(()),
            Filter::Eq(column, _) => check_column(table, column),
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().try_for_each(|filter| filter.check(table))
            }
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

/// A `SELECT` over one table: filter, ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order: Vec<Order>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = std::mem::take(&mut self.filter).and(filter);
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order.push(Order { column, direction });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn check(&self, table: &Table) -> Result<(), AppError> {
        self.filter.check(table)?;
        self.order
            .iter()
            .try_for_each(|order| check_column(table, order.column))
    }

    /// Compares two rows of `table` by this query's ordering.
    pub fn compare(&self, table: &Table, left: &Row, right: &Row) -> Ordering {
        for order in &self.order {
            let ordering = match (left.get(order.column), right.get(order.column)) {
                (Some(a), Some(b)) => match table.column(order.column) {
                    Some(column) if column.scale.is_some() => column.rank(a).cmp(&column.rank(b)),
                    _ => a.sort_cmp(b),
                },
                _ => Ordering::Equal,
            };
            let ordering = match order.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn check_column(table: &Table, column: &str) -> Result<(), AppError> {
    match table.column(column) {
        Some(_) => Ok(()),
        None => Err(AppError::InternalServerError(format!(
            "column {:?} does not exist on table {:?}",
            column, table.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::{Column, ColumnType};
    use pretty_assertions::assert_eq;

    static SCALE: &[&str] = &["Low", "Medium", "High"];

    static TICKETS: Table = Table {
        name: "tickets",
        columns: &[
            Column::serial("id"),
            Column::new("title", ColumnType::Text),
            Column::new("state", ColumnType::Text),
            Column::new("priority", ColumnType::Text).ranked(SCALE),
        ],
    };

    fn ticket(id: i32, title: &str, state: &str, priority: &str) -> Row {
        Row::new(
            &TICKETS,
            vec![
                Value::Integer(id),
                title.into(),
                state.into(),
                priority.into(),
            ],
        )
    }

    #[test]
    fn test_filter_combinators_flatten() {
        let filter = Filter::eq("state", "Open")
            .and(Filter::eq("priority", "High"))
            .and(Filter::eq("title", "x"));
        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::eq("state", "Open"),
                Filter::eq("priority", "High"),
                Filter::eq("title", "x"),
            ])
        );

        assert_eq!(Filter::All.and(Filter::eq("state", "Open")), Filter::eq("state", "Open"));
        assert_eq!(Filter::eq("state", "Open").or(Filter::All), Filter::All);
    }

    #[test]
    fn test_filter_matches() {
        let row = ticket(1, "Write docs", "Open", "Low");

        assert!(Filter::All.matches(&row));
        assert!(Filter::eq("state", "Open").matches(&row));
        assert!(!Filter::eq("state", "Closed").matches(&row));
        assert!(!Filter::eq("state", "Open")
            .and(Filter::eq("priority", "High"))
            .matches(&row));
        assert!(Filter::eq("state", "Closed")
            .or(Filter::eq("priority", "Low"))
            .matches(&row));
        assert!(!Filter::Or(vec![]).matches(&row));
    }

    #[test]
    fn test_compare_uses_scale_then_text() {
        let query = Query::new()
            .order_by("priority", Direction::Desc)
            .order_by("title", Direction::Asc);
        let mut rows = vec![
            ticket(1, "b", "Open", "Medium"),
            ticket(2, "z", "Open", "High"),
            ticket(3, "a", "Open", "Medium"),
            ticket(4, "c", "Open", "High"),
            ticket(5, "d", "Open", "Someday"),
        ];
        rows.sort_by(|a, b| query.compare(&TICKETS, a, b));

        let ids: Vec<i32> = rows.iter().map(|row| row.integer("id").unwrap()).collect();
        assert_eq!(ids, vec![4, 2, 3, 1, 5]);
    }

    #[test]
    fn test_check_rejects_unknown_columns() {
        assert!(Query::new()
            .filter(Filter::eq("state", "Open"))
            .order_by("title", Direction::Asc)
            .check(&TICKETS)
            .is_ok());

        let bad_filter = Query::new().filter(Filter::eq("owner", 1));
        assert!(matches!(
            bad_filter.check(&TICKETS),
            Err(AppError::InternalServerError(_))
        ));

        let bad_order = Query::new().order_by("created_at; DROP TABLE tickets", Direction::Asc);
        assert!(bad_order.check(&TICKETS).is_err());
    }
}
