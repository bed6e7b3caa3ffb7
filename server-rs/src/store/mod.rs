//! Data access for every collection the API touches.
//!
//! Handlers only see [`Store`], an object-safe trait assembled from one
//! repository trait per collection. Two implementations exist: [`PgStore`]
//! over Postgres and [`MemoryStore`], an in-process fallback used in tests
//! and when no database is reachable. The backend is picked once at startup
//! by [`open`] and injected through `AppState`.

pub mod memory;
pub mod populate;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::models::*;
use crate::pagination::Window;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Duplicate(db.constraint().unwrap_or("unique").to_string());
            }
            if db.is_check_violation() {
                return StoreError::Validation(vec![format!(
                    "Value rejected by constraint {}",
                    db.constraint().unwrap_or("check")
                )]);
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of an ordered query plus the size of the full result.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Comparison of a nullable timestamp column against a fixed instant.
/// Records without a timestamp never match.
#[derive(Debug, Clone, Copy)]
pub enum TimeBound {
    NotBefore(DateTime<Utc>),
    NotAfter(DateTime<Utc>),
    After(DateTime<Utc>),
}

impl TimeBound {
    pub fn matches(&self, value: Option<DateTime<Utc>>) -> bool {
        match (self, value) {
            (_, None) => false,
            (TimeBound::NotBefore(t), Some(v)) => v >= *t,
            (TimeBound::NotAfter(t), Some(v)) => v <= *t,
            (TimeBound::After(t), Some(v)) => v > *t,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TournamentOrder {
    #[default]
    Newest,
    /// Soonest start first, unscheduled last.
    StartDate,
}

#[derive(Debug, Clone, Default)]
pub struct TournamentFilter {
    pub status: Option<TournamentStatus>,
    pub format: Option<String>,
    pub game_name: Option<String>,
    pub organizer_id: Option<Uuid>,
    /// Case-insensitive substring over name, game name and description.
    pub search: Option<String>,
    pub starts: Option<TimeBound>,
    pub order: TournamentOrder,
}

/// Matches are always ordered by schedule (unscheduled last), newest first
/// among equals.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub tournament_id: Option<Uuid>,
    pub status: Option<MatchStatus>,
    pub competitor_id: Option<Uuid>,
    pub scheduled: Option<TimeBound>,
}

/// News is always ordered by publication date (unpublished last), newest
/// first among equals.
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    pub status: Option<NewsStatus>,
    pub tournament_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    /// Case-insensitive substring over title and content.
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    Registered {
        competitor: Competitor,
        tournament: Tournament,
    },
    TournamentNotFound,
    NotOpen,
    Full,
    AlreadyRegistered,
}

#[derive(Debug, Clone)]
pub enum WithdrawOutcome {
    Withdrawn(Tournament),
    /// The competitor is not (or no longer) on the tournament's list.
    NotRegistered,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<User>>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait TournamentStore: Send + Sync {
    async fn create_tournament(&self, tournament: NewTournament) -> StoreResult<Tournament>;
    async fn find_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>>;
    async fn find_tournaments(&self, ids: &[Uuid]) -> StoreResult<Vec<Tournament>>;
    async fn list_tournaments(
        &self,
        filter: &TournamentFilter,
        window: Window,
    ) -> StoreResult<Paged<Tournament>>;
    async fn update_tournament(
        &self,
        id: Uuid,
        update: TournamentUpdate,
    ) -> StoreResult<Option<Tournament>>;

    /// Removes the tournament together with its matches and competitors.
    async fn delete_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>>;

    /// Creates the competitor and, in the same atomic step, appends it to the
    /// tournament and bumps the player counter, but only while the tournament
    /// is upcoming and below capacity.
    async fn register_competitor(&self, competitor: NewCompetitor) -> StoreResult<RegisterOutcome>;

    /// Pulls the competitor from the tournament, decrements the counter and
    /// deletes the competitor as one unit.
    async fn withdraw_competitor(
        &self,
        tournament_id: Uuid,
        competitor_id: Uuid,
    ) -> StoreResult<WithdrawOutcome>;
}

#[async_trait]
pub trait CompetitorStore: Send + Sync {
    async fn find_competitor(&self, id: Uuid) -> StoreResult<Option<Competitor>>;
    async fn find_competitors(&self, ids: &[Uuid]) -> StoreResult<Vec<Competitor>>;
    async fn find_registration(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Competitor>>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn create_match(&self, game: NewMatch) -> StoreResult<Match>;
    async fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>>;
    async fn list_matches(&self, filter: &MatchFilter, window: Window) -> StoreResult<Paged<Match>>;
    async fn update_match(&self, id: Uuid, update: MatchUpdate) -> StoreResult<Option<Match>>;
    async fn delete_match(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn create_news(&self, news: NewNews) -> StoreResult<News>;
    async fn find_news(&self, id: Uuid) -> StoreResult<Option<News>>;
    async fn list_news(&self, filter: &NewsFilter, window: Window) -> StoreResult<Paged<News>>;
    async fn update_news(&self, id: Uuid, update: NewsUpdate) -> StoreResult<Option<News>>;
    async fn delete_news(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait Store: UserStore + TournamentStore + CompetitorStore + MatchStore + NewsStore {
    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> bool;
}

/// Opens the configured backend. `auto` degrades to the in-memory store when
/// Postgres cannot be reached.
pub async fn open(config: &Config) -> StoreResult<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => Ok(Arc::new(PgStore::connect(config).await?)),
        StoreBackend::Auto => match PgStore::connect(config).await {
            Ok(store) => Ok(Arc::new(store)),
            Err(e) => {
                tracing::warn!(error = %e, "Postgres unavailable, falling back to in-memory store");
                Ok(Arc::new(MemoryStore::new()))
            }
        },
    }
}

fn schema(result: Result<(), Vec<String>>) -> StoreResult<()> {
    result.map_err(StoreError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn time_bounds_skip_missing_timestamps() {
        let now = Utc::now();
        assert!(!TimeBound::NotBefore(now).matches(None));
        assert!(TimeBound::NotBefore(now).matches(Some(now)));
        assert!(!TimeBound::After(now).matches(Some(now)));
        assert!(TimeBound::After(now).matches(Some(now + Duration::seconds(1))));
        assert!(TimeBound::NotAfter(now).matches(Some(now - Duration::days(1))));
    }
}
