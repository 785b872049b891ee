use chrono::NaiveDate;

use crate::error::AppError;
use crate::store::query::{Direction, Query};
use crate::store::schema::{Column, ColumnType, Table};
use crate::store::{Insertable, NewRow, Record, Row};

/// Priority labels from lowest to highest; orders the `priority` column.
pub static PRIORITY_SCALE: &[&str] = &["Low", "Medium", "High"];

pub static CARDS: Table = Table {
    name: "cards",
    columns: &[
        Column::serial("id"),
        Column::new("title", ColumnType::VarChar(Some(100))),
        Column::new("description", ColumnType::Text),
        Column::new("date", ColumnType::Date),
        Column::new("status", ColumnType::VarChar(None)),
        Column::new("priority", ColumnType::VarChar(None)).ranked(PRIORITY_SCALE),
    ],
};

/// A card on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: i32,
    /// Short title, at most 100 characters.
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    /// Free-text label such as "To Do", "Ongoing" or "Done".
    pub status: String,
    /// Free-text label such as "High", "Medium" or "Low".
    pub priority: String,
}

impl Card {
    /// Board order: highest priority first, then alphabetical by title.
    pub fn board_order() -> Query {
        Query::new()
            .order_by("priority", Direction::Desc)
            .order_by("title", Direction::Asc)
    }
}

impl Record for Card {
    fn table() -> &'static Table {
        &CARDS
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Self {
            id: row.integer("id")?,
            title: row.text("title")?,
            description: row.text("description")?,
            date: row.date("date")?,
            status: row.text("status")?,
            priority: row.text("priority")?,
        })
    }

    fn to_row(&self) -> Row {
        Row::new(
            &CARDS,
            vec![
                self.id.into(),
                self.title.clone().into(),
                self.description.clone().into(),
                self.date.into(),
                self.status.clone().into(),
                self.priority.clone().into(),
            ],
        )
    }
}

/// A card that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub status: String,
    pub priority: String,
}

impl NewCard {
    pub fn new(title: &str, description: &str, status: &str, priority: &str, date: NaiveDate) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            date,
            status: status.to_string(),
            priority: priority.to_string(),
        }
    }
}

impl Insertable for NewCard {
    type Record = Card;

    fn assignments(&self) -> NewRow {
        vec![
            ("title", self.title.clone().into()),
            ("description", self.description.clone().into()),
            ("date", self.date.into()),
            ("status", self.status.clone().into()),
            ("priority", self.priority.clone().into()),
        ]
    }
}
