//! PostgreSQL warehouse for raw readings and training results
//!
//! All tables live in one schema named after the project and dataset.
//! Tables are append-only and created on demand by
//! [`DbClient::ensure_schema`].

pub mod client;
pub mod queries;
pub mod schema;
mod store;

pub use client::*;
pub use schema::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type DbResult<T> = Result<T, DbError>;
