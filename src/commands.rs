//! Maintenance operations behind the `cli` binary.
//!
//! They take any [`Store`] so they run the same against PostgreSQL and the memory store.

use chrono::{NaiveDate, Utc};

use crate::auth::hash_password;
use crate::error::AppError;
use crate::models::{Card, NewCard, NewUser, User, TABLES};
use crate::store::query::{Direction, Filter, Query};
use crate::store::{self, Store};

pub async fn create_all(store: &dyn Store) -> Result<(), AppError> {
    store.create_tables(&TABLES).await
}

pub async fn drop_all(store: &dyn Store) -> Result<(), AppError> {
    store.drop_tables(&TABLES).await
}

/// The sample board, dated `date`.
pub fn sample_cards(date: NaiveDate) -> Vec<NewCard> {
    vec![
        NewCard::new("Start the project", "Stage 1 - Create the database", "To Do", "High", date),
        NewCard::new("SQLAlchemy", "Stage 2 - Integrate ORM", "Ongoing", "High", date),
        NewCard::new("ORM Queries", "Stage 3 - Implement several queries", "Ongoing", "Medium", date),
        NewCard::new(
            "Marshmallow",
            "Stage 4 - Implement Marshmallow to jsonify models",
            "Done",
            "Medium",
            date,
        ),
    ]
}

/// The sample accounts, passwords hashed at `bcrypt_cost`.
pub fn sample_users(bcrypt_cost: u32) -> Result<Vec<NewUser>, AppError> {
    Ok(vec![
        NewUser {
            name: None,
            email: "admin@spam.com".to_string(),
            password: hash_password("spinynorman", bcrypt_cost)?,
            is_admin: Some(true),
        },
        NewUser {
            name: Some("John Cleese".to_string()),
            email: "someone@spam.com".to_string(),
            password: hash_password("tisbutascratch", bcrypt_cost)?,
            is_admin: None,
        },
    ])
}

/// Inserts the sample cards (dated today) and users.
pub async fn seed(store: &dyn Store, bcrypt_cost: u32) -> Result<(Vec<Card>, Vec<User>), AppError> {
    let cards = store::insert_all(store, &sample_cards(Utc::now().date_naive())).await?;
    let users = store::insert_all(store, &sample_users(bcrypt_cost)?).await?;
    Ok((cards, users))
}

/// The card with the lowest id.
pub async fn first_card(store: &dyn Store) -> Result<Option<Card>, AppError> {
    store::fetch_first(store, Query::new().order_by("id", Direction::Asc)).await
}

pub async fn count_ongoing(store: &dyn Store) -> Result<i64, AppError> {
    store::count::<Card>(store, &Filter::eq("status", "Ongoing")).await
}

pub async fn all_cards(store: &dyn Store) -> Result<Vec<Card>, AppError> {
    store::fetch(store, &Card::board_order()).await
}

/// Cards that still need attention: not started, or high priority.
pub async fn todo_or_high(store: &dyn Store) -> Result<Vec<Card>, AppError> {
    let query = Query::new()
        .filter(Filter::eq("status", "To Do").or(Filter::eq("priority", "High")))
        .order_by("id", Direction::Asc);
    store::fetch(store, &query).await
}
