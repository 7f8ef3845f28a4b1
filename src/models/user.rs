use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_emission: Decimal,
}
