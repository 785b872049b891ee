pub mod card;
pub mod user;

pub use card::{Card, NewCard, CARDS, PRIORITY_SCALE};
pub use user::{NewUser, User, USERS};

use crate::store::schema::Table;

/// Every table the application owns, in creation order.
pub static TABLES: [&Table; 2] = [&CARDS, &USERS];
