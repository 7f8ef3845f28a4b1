use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbResult, Repository};
use crate::models::activity::{Activity, ActivityFilter, NewActivity};
use crate::models::user::LeaderboardEntry;
use crate::utils::date::{month_window, parse_date, week_window, DateWindow};

/// Owner-scoped filtering and aggregation over activity records.
///
/// The owner is always an explicit argument; nothing here reads request state.
#[derive(Clone)]
pub struct ActivityService {
    repo: Arc<dyn Repository>,
}

impl ActivityService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    /// Lists the owner's activities. A date that fails to parse is ignored
    /// and the unfiltered list comes back.
    pub async fn list(&self, owner: Uuid, date: Option<&str>) -> DbResult<Vec<Activity>> {
        let filter = match date.map(parse_date) {
            Some(Ok(day)) => ActivityFilter::On(day),
            Some(Err(err)) => {
                debug!("Ignoring date filter for {}: {}", owner, err);
                ActivityFilter::All
            }
            None => ActivityFilter::All,
        };
        self.repo.list_activities(owner, filter).await
    }

    pub async fn create(&self, owner: Uuid, activity: NewActivity) -> DbResult<Activity> {
        let created = self.repo.insert_activity(owner, activity).await?;
        debug!("Created activity {} for {}", created.activity_id, owner);
        Ok(created)
    }

    /// Activities on exactly `date`; empty when it does not parse.
    pub async fn on_date(&self, owner: Uuid, date: &str) -> DbResult<Vec<Activity>> {
        match parse_date(date) {
            Ok(day) => self.repo.list_activities(owner, ActivityFilter::On(day)).await,
            Err(err) => {
                debug!("Empty result for {}: {}", owner, err);
                Ok(Vec::new())
            }
        }
    }

    /// Activities from the Sunday on or before `end_date` through `end_date`.
    pub async fn week_ending(&self, owner: Uuid, end_date: &str) -> DbResult<Vec<Activity>> {
        self.within(owner, end_date, week_window).await
    }

    /// Activities in the calendar month containing `date`.
    pub async fn month_of(&self, owner: Uuid, date: &str) -> DbResult<Vec<Activity>> {
        self.within(owner, date, month_window).await
    }

    async fn within(
        &self,
        owner: Uuid,
        date: &str,
        window_for: fn(chrono::NaiveDate) -> Option<DateWindow>,
    ) -> DbResult<Vec<Activity>> {
        let window = match parse_date(date).map(window_for) {
            Ok(Some(window)) => window,
            Ok(None) => {
                debug!("Empty result for {}: no calendar window around {}", owner, date);
                return Ok(Vec::new());
            }
            Err(err) => {
                debug!("Empty result for {}: {}", owner, err);
                return Ok(Vec::new());
            }
        };
        debug!("Listing activities for {} between {} and {}", owner, window.start, window.end);
        self.repo
            .list_activities(owner, ActivityFilter::Between(window))
            .await
    }

    pub async fn footprint(&self, owner: Uuid) -> DbResult<Decimal> {
        self.repo.total_emission(owner).await
    }

    /// All users ranked by total emission, lowest first. Ties keep
    /// registration order.
    pub async fn leaderboard(&self) -> DbResult<Vec<LeaderboardEntry>> {
        let mut entries: Vec<LeaderboardEntry> = self
            .repo
            .user_totals()
            .await?
            .into_iter()
            .map(|(username, total_emission)| LeaderboardEntry {
                username,
                total_emission,
            })
            .collect();
        entries.sort_by(|a, b| a.total_emission.cmp(&b.total_emission));
        Ok(entries)
    }
}
