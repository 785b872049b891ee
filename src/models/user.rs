use crate::error::AppError;
use crate::store::query::{Filter, Query};
use crate::store::schema::{Column, ColumnType, Table};
use crate::store::{fetch_first, Insertable, NewRow, Record, Row, Store};

pub static USERS: Table = Table {
    name: "users",
    columns: &[
        Column::serial("id"),
        Column::new("name", ColumnType::VarChar(None)).nullable(),
        Column::new("email", ColumnType::VarChar(None)).unique(),
        Column::new("password", ColumnType::VarChar(None)),
        Column::new("is_admin", ColumnType::Boolean).default_bool(false),
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub name: Option<String>,
    pub email: String,
    /// bcrypt hash, never the plaintext.
    pub password: String,
    pub is_admin: bool,
}

impl User {
    pub async fn find_by_email(store: &dyn Store, email: &str) -> Result<Option<User>, AppError> {
        fetch_first(store, Query::new().filter(Filter::eq("email", email))).await
    }
}

impl Record for User {
    fn table() -> &'static Table {
        &USERS
    }

    fn from_row(row: &Row) -> Result<Self, AppError> {
        Ok(Self {
            id: row.integer("id")?,
            name: row.optional_text("name")?,
            email: row.text("email")?,
            password: row.text("password")?,
            is_admin: row.boolean("is_admin")?,
        })
    }

    fn to_row(&self) -> Row {
        Row::new(
            &USERS,
            vec![
                self.id.into(),
                self.name.clone().into(),
                self.email.clone().into(),
                self.password.clone().into(),
                self.is_admin.into(),
            ],
        )
    }
}

/// A user that has not been stored yet. `password` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    /// `None` leaves the column default (not an admin).
    pub is_admin: Option<bool>,
}

impl Insertable for NewUser {
    type Record = User;

    fn assignments(&self) -> NewRow {
        let mut assignments: NewRow = vec![
            ("name", self.name.clone().into()),
            ("email", self.email.clone().into()),
            ("password", self.password.clone().into()),
        ];
        if let Some(is_admin) = self.is_admin {
            assignments.push(("is_admin", is_admin.into()));
        }
        assignments
    }
}
