use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::utils::date::DateWindow;

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Activity {
    #[serde(rename = "id")]
    pub activity_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub quantity: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub carbon_emission_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A validated activity awaiting insertion. Carries no owner; the owner is
/// always supplied separately by the authenticated caller.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub carbon_emission_kg: Decimal,
}

/// Row restriction applied on top of the mandatory owner filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityFilter {
    All,
    On(NaiveDate),
    Between(DateWindow),
}

impl ActivityFilter {
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            ActivityFilter::All => true,
            ActivityFilter::On(day) => *day == date,
            ActivityFilter::Between(window) => window.contains(date),
        }
    }
}
