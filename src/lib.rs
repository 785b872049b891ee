#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Record mapping, persistence backends, serialization views, authentication, routing"]
#![doc = "and maintenance commands for the task-board backend. Both binaries (`main.rs`, the"]
#![doc = "HTTP server, and `bin/cli.rs`, the maintenance CLI) are thin shells around it."]

pub mod auth;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod routes;
pub mod serialize;
pub mod store;

pub use context::AppContext;
pub use error::AppError;
