use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::activity::{Activity, ActivityFilter, NewActivity};
use crate::models::user::User;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Persistent store for users and their activities.
///
/// Every activity read takes the owner explicitly and must never return rows
/// belonging to anyone else.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Returns `None` when the username is already taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>>;

    /// Inserts an activity owned by `owner`; the store assigns the id.
    async fn insert_activity(&self, owner: Uuid, activity: NewActivity) -> DbResult<Activity>;

    /// Owner's activities in insertion order.
    async fn list_activities(&self, owner: Uuid, filter: ActivityFilter) -> DbResult<Vec<Activity>>;

    /// Sum of the owner's emissions, zero when there are none.
    async fn total_emission(&self, owner: Uuid) -> DbResult<Decimal>;

    /// Every user paired with their zero-defaulted total, in registration order.
    async fn user_totals(&self) -> DbResult<Vec<(String, Decimal)>>;
}
