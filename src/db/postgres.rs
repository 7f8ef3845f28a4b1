use async_trait::async_trait;
use chrono::Utc;
use log::info;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DbError, DbResult, Repository};
use crate::models::activity::{Activity, ActivityFilter, NewActivity};
use crate::models::user::User;

const ACTIVITY_COLUMNS: &str =
    "activity_id, user_id, date, category, description, quantity, carbon_emission_kg, created_at";

pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (user_id, username, password, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (username) DO NOTHING
            RETURNING user_id, username, password",
        )
        .bind(Uuid::now_v7())
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_activity(&self, owner: Uuid, activity: NewActivity) -> DbResult<Activity> {
        let sql = format!(
            "INSERT INTO activities ({ACTIVITY_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ACTIVITY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Activity>(&sql)
            .bind(Uuid::now_v7())
            .bind(owner)
            .bind(activity.date)
            .bind(&activity.category)
            .bind(&activity.description)
            .bind(activity.quantity)
            .bind(activity.carbon_emission_kg)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_activities(&self, owner: Uuid, filter: ActivityFilter) -> DbResult<Vec<Activity>> {
        let mut sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE user_id = $1");
        match filter {
            ActivityFilter::All => {}
            ActivityFilter::On(_) => sql.push_str(" AND date = $2"),
            ActivityFilter::Between(_) => sql.push_str(" AND date BETWEEN $2 AND $3"),
        }
        sql.push_str(" ORDER BY created_at, activity_id");

        let query = sqlx::query_as::<_, Activity>(&sql).bind(owner);
        let query = match filter {
            ActivityFilter::All => query,
            ActivityFilter::On(day) => query.bind(day),
            ActivityFilter::Between(window) => query.bind(window.start).bind(window.end),
        };
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn total_emission(&self, owner: Uuid) -> DbResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(carbon_emission_kg), 0) FROM activities WHERE user_id = $1",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn user_totals(&self) -> DbResult<Vec<(String, Decimal)>> {
        let rows: Vec<(String, Decimal)> = sqlx::query_as(
            "SELECT u.username, COALESCE(SUM(a.carbon_emission_kg), 0)
            FROM users u
            LEFT JOIN activities a ON a.user_id = u.user_id
            GROUP BY u.user_id, u.username, u.created_at
            ORDER BY u.created_at, u.user_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
