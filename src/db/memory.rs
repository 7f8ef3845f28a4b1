use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::RwLock;
use uuid::Uuid;

use super::{DbError, DbResult, Repository};
use crate::models::activity::{Activity, ActivityFilter, NewActivity};
use crate::models::user::User;

/// Process-local store used when no database is configured.
///
/// Rows live in insertion order, which doubles as the iteration order the
/// trait promises.
#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<Vec<User>>,
    activities: RwLock<Vec<Activity>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sum_for(activities: &[Activity], owner: Uuid) -> DbResult<Decimal> {
    activities
        .iter()
        .filter(|a| a.user_id == owner)
        .try_fold(Decimal::ZERO, |total, a| {
            total
                .checked_add(a.carbon_emission_kg)
                .ok_or_else(|| DbError::Overflow(format!("emission total for {}", owner)))
        })
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> DbResult<Option<User>> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.iter().any(|u| u.username == username) {
            return Ok(None);
        }
        let user = User {
            user_id: Uuid::now_v7(),
            username: username.to_string(),
            password: password_hash.to_string(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_activity(&self, owner: Uuid, activity: NewActivity) -> DbResult<Activity> {
        let row = Activity {
            activity_id: Uuid::now_v7(),
            user_id: owner,
            date: activity.date,
            category: activity.category,
            description: activity.description,
            quantity: activity.quantity,
            carbon_emission_kg: activity.carbon_emission_kg,
            created_at: Utc::now(),
        };
        self.activities
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(row.clone());
        Ok(row)
    }

    async fn list_activities(&self, owner: Uuid, filter: ActivityFilter) -> DbResult<Vec<Activity>> {
        let activities = self.activities.read().unwrap_or_else(|e| e.into_inner());
        Ok(activities
            .iter()
            .filter(|a| a.user_id == owner && filter.matches(a.date))
            .cloned()
            .collect())
    }

    async fn total_emission(&self, owner: Uuid) -> DbResult<Decimal> {
        let activities = self.activities.read().unwrap_or_else(|e| e.into_inner());
        sum_for(&activities, owner)
    }

    async fn user_totals(&self) -> DbResult<Vec<(String, Decimal)>> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        let activities = self.activities.read().unwrap_or_else(|e| e.into_inner());
        users
            .iter()
            .map(|u| sum_for(&activities, u.user_id).map(|total| (u.username.clone(), total)))
            .collect()
    }
}
