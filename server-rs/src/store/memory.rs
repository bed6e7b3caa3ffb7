use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::*;

/// Every collection behind a single lock, so a write guard makes a
/// multi-record change atomic.
#[derive(Default)]
struct Collections {
    users: Vec<User>,
    tournaments: Vec<Tournament>,
    competitors: Vec<Competitor>,
    matches: Vec<Match>,
    news: Vec<News>,
}

/// In-process store. Collections keep insertion order, which breaks ties
/// between records created in the same instant.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Ascending by timestamp with missing values last.
fn nulls_last(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn desc_nulls_last(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        _ => nulls_last(a, b),
    }
}

/// Reverse insertion order, so a later stable sort keeps newest first
/// among equal keys.
fn newest_first<T: Clone>(items: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    items.iter().rev().filter(|&i| keep(i)).cloned().collect()
}

fn page<T>(items: Vec<T>, window: Window) -> Paged<T> {
    let total = items.len() as u64;
    Paged {
        items: window.slice(items),
        total,
    }
}

impl Collections {
    fn tournament_mut(&mut self, id: Uuid) -> Option<&mut Tournament> {
        self.tournaments.iter_mut().find(|t| t.id == id)
    }

    fn remove_competitors(&mut self, ids: &[Uuid]) {
        self.competitors.retain(|c| !ids.contains(&c.id));
        for m in &mut self.matches {
            if m.team_a.is_some_and(|id| ids.contains(&id)) {
                m.team_a = None;
            }
            if m.team_b.is_some_and(|id| ids.contains(&id)) {
                m.team_b = None;
            }
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        schema(user.validate())?;
        let mut data = self.data.write().await;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("users_email_key".into()));
        }
        let user = user.into_user();
        data.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<User>> {
        schema(update.validate())?;
        let mut data = self.data.write().await;
        Ok(data.users.iter_mut().find(|u| u.id == id).map(|u| {
            update.apply(u);
            u.clone()
        }))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        Ok(match data.users.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn create_tournament(&self, tournament: NewTournament) -> StoreResult<Tournament> {
        schema(tournament.validate())?;
        let tournament = tournament.into_tournament();
        self.data.write().await.tournaments.push(tournament.clone());
        Ok(tournament)
    }

    async fn find_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>> {
        let data = self.data.read().await;
        Ok(data.tournaments.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tournaments(&self, ids: &[Uuid]) -> StoreResult<Vec<Tournament>> {
        let data = self.data.read().await;
        Ok(data
            .tournaments
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn list_tournaments(
        &self,
        filter: &TournamentFilter,
        window: Window,
    ) -> StoreResult<Paged<Tournament>> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let data = self.data.read().await;
        let mut items = newest_first(&data.tournaments, |t| {
            filter.status.map_or(true, |s| t.status == s)
                && filter
                    .format
                    .as_ref()
                    .map_or(true, |f| t.format.as_ref() == Some(f))
                && filter
                    .game_name
                    .as_ref()
                    .map_or(true, |g| t.game_name.as_ref() == Some(g))
                && filter.organizer_id.map_or(true, |o| t.organizer_id == o)
                && filter.starts.map_or(true, |b| b.matches(t.start_date))
                && search.as_deref().map_or(true, |q| {
                    contains_ci(&t.name, q)
                        || t.game_name.as_deref().is_some_and(|g| contains_ci(g, q))
                        || t.description.as_deref().is_some_and(|d| contains_ci(d, q))
                })
        });
        if filter.order == TournamentOrder::StartDate {
            items.sort_by(|a, b| nulls_last(a.start_date, b.start_date));
        }
        Ok(page(items, window))
    }

    async fn update_tournament(
        &self,
        id: Uuid,
        update: TournamentUpdate,
    ) -> StoreResult<Option<Tournament>> {
        let mut data = self.data.write().await;
        let Some(t) = data.tournament_mut(id) else {
            return Ok(None);
        };
        schema(update.validate_against(t))?;
        update.apply(t);
        Ok(Some(t.clone()))
    }

    async fn delete_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>> {
        let mut data = self.data.write().await;
        let Some(pos) = data.tournaments.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let tournament = data.tournaments.remove(pos);
        data.matches.retain(|m| m.tournament_id != id);
        let mut doomed = tournament.competitor.clone();
        doomed.extend(
            data.competitors
                .iter()
                .filter(|c| c.tournament_id == id)
                .map(|c| c.id),
        );
        data.remove_competitors(&doomed);
        for n in &mut data.news {
            if n.tournament_id == Some(id) {
                n.tournament_id = None;
            }
        }
        Ok(Some(tournament))
    }

    async fn register_competitor(&self, competitor: NewCompetitor) -> StoreResult<RegisterOutcome> {
        schema(competitor.validate())?;
        let mut data = self.data.write().await;

        let already = competitor.user_id.is_some_and(|uid| {
            data.competitors
                .iter()
                .any(|c| c.tournament_id == competitor.tournament_id && c.user_id == Some(uid))
        });

        let Some(t) = data.tournament_mut(competitor.tournament_id) else {
            return Ok(RegisterOutcome::TournamentNotFound);
        };
        if t.status != TournamentStatus::Upcoming {
            return Ok(RegisterOutcome::NotOpen);
        }
        if t.is_full() {
            return Ok(RegisterOutcome::Full);
        }
        if already {
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        let competitor = competitor.into_competitor();
        t.competitor.push(competitor.id);
        t.number_of_players += 1;
        let tournament = t.clone();
        data.competitors.push(competitor.clone());

        Ok(RegisterOutcome::Registered {
            competitor,
            tournament,
        })
    }

    async fn withdraw_competitor(
        &self,
        tournament_id: Uuid,
        competitor_id: Uuid,
    ) -> StoreResult<WithdrawOutcome> {
        let mut data = self.data.write().await;
        let Some(t) = data.tournament_mut(tournament_id) else {
            return Ok(WithdrawOutcome::NotRegistered);
        };
        let Some(pos) = t.competitor.iter().position(|id| *id == competitor_id) else {
            return Ok(WithdrawOutcome::NotRegistered);
        };
        t.competitor.remove(pos);
        t.number_of_players -= 1;
        let tournament = t.clone();
        data.remove_competitors(&[competitor_id]);
        Ok(WithdrawOutcome::Withdrawn(tournament))
    }
}

#[async_trait]
impl CompetitorStore for MemoryStore {
    async fn find_competitor(&self, id: Uuid) -> StoreResult<Option<Competitor>> {
        let data = self.data.read().await;
        Ok(data.competitors.iter().find(|c| c.id == id).cloned())
    }

    async fn find_competitors(&self, ids: &[Uuid]) -> StoreResult<Vec<Competitor>> {
        let data = self.data.read().await;
        Ok(data
            .competitors
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn find_registration(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Competitor>> {
        let data = self.data.read().await;
        Ok(data
            .competitors
            .iter()
            .find(|c| c.tournament_id == tournament_id && c.user_id == Some(user_id))
            .cloned())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn create_match(&self, game: NewMatch) -> StoreResult<Match> {
        schema(game.validate())?;
        let game = game.into_match();
        self.data.write().await.matches.push(game.clone());
        Ok(game)
    }

    async fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let data = self.data.read().await;
        Ok(data.matches.iter().find(|m| m.id == id).cloned())
    }

    async fn list_matches(&self, filter: &MatchFilter, window: Window) -> StoreResult<Paged<Match>> {
        let data = self.data.read().await;
        let mut items = newest_first(&data.matches, |m| {
            filter.tournament_id.map_or(true, |t| m.tournament_id == t)
                && filter.status.map_or(true, |s| m.status == s)
                && filter.competitor_id.map_or(true, |c| m.involves(c))
                && filter.scheduled.map_or(true, |b| b.matches(m.scheduled_at))
        });
        items.sort_by(|a, b| nulls_last(a.scheduled_at, b.scheduled_at));
        Ok(page(items, window))
    }

    async fn update_match(&self, id: Uuid, update: MatchUpdate) -> StoreResult<Option<Match>> {
        schema(update.validate())?;
        let mut data = self.data.write().await;
        Ok(data.matches.iter_mut().find(|m| m.id == id).map(|m| {
            update.apply(m);
            m.clone()
        }))
    }

    async fn delete_match(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let before = data.matches.len();
        data.matches.retain(|m| m.id != id);
        Ok(data.matches.len() < before)
    }
}

#[async_trait]
impl NewsStore for MemoryStore {
    async fn create_news(&self, news: NewNews) -> StoreResult<News> {
        schema(news.validate())?;
        let news = news.into_news();
        self.data.write().await.news.push(news.clone());
        Ok(news)
    }

    async fn find_news(&self, id: Uuid) -> StoreResult<Option<News>> {
        let data = self.data.read().await;
        Ok(data.news.iter().find(|n| n.id == id).cloned())
    }

    async fn list_news(&self, filter: &NewsFilter, window: Window) -> StoreResult<Paged<News>> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let data = self.data.read().await;
        let mut items = newest_first(&data.news, |n| {
            filter.status.map_or(true, |s| n.status == s)
                && filter.tournament_id.map_or(true, |t| n.tournament_id == Some(t))
                && filter.author_id.map_or(true, |a| n.author_id == a)
                && search
                    .as_deref()
                    .map_or(true, |q| contains_ci(&n.title, q) || contains_ci(&n.content, q))
        });
        items.sort_by(|a, b| desc_nulls_last(a.published_at, b.published_at));
        Ok(page(items, window))
    }

    async fn update_news(&self, id: Uuid, update: NewsUpdate) -> StoreResult<Option<News>> {
        schema(update.validate())?;
        let mut data = self.data.write().await;
        Ok(data.news.iter_mut().find(|n| n.id == id).map(|n| {
            update.apply(n);
            n.clone()
        }))
    }

    async fn delete_news(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let before = data.news.len();
        data.news.retain(|n| n.id != id);
        Ok(data.news.len() < before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> bool {
        true
    }
}
