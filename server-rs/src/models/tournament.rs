use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{de_datetime, Competitor, SchemaCheck, UnknownVariant, UserRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    #[default]
    Upcoming,
    Ongoing,
    Done,
}

impl TournamentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Ongoing => "ongoing",
            TournamentStatus::Done => "done",
        }
    }
}

impl FromStr for TournamentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "ongoing" => Ok(Self::Ongoing),
            "done" => Ok(Self::Done),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: Uuid,
    pub name: String,
    pub format: Option<String>,
    pub description: Option<String>,
    pub game_name: Option<String>,
    pub organizer_id: Uuid,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_players: Option<i32>,
    pub number_of_players: i32,
    pub status: TournamentStatus,
    /// Registered competitor ids in registration order.
    pub competitor: Vec<Uuid>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    pub fn is_full(&self) -> bool {
        matches!(self.max_players, Some(max) if self.number_of_players >= max)
    }
}

#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub format: Option<String>,
    pub description: Option<String>,
    pub game_name: Option<String>,
    pub organizer_id: Uuid,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_players: Option<i32>,
    pub avatar_url: Option<String>,
}

impl NewTournament {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        SchemaCheck::new()
            .require(&self.name, "Tournament name is required")
            .ensure(
                self.max_players.map_or(true, |m| m >= 1),
                "Maximum players must be at least 1",
            )
            .ensure(
                dates_ordered(self.start_date, self.end_date),
                "End date must be after start date",
            )
            .finish()
    }

    pub fn into_tournament(self) -> Tournament {
        Tournament {
            id: Uuid::new_v4(),
            name: self.name,
            format: self.format,
            description: self.description,
            game_name: self.game_name,
            organizer_id: self.organizer_id,
            start_date: self.start_date,
            end_date: self.end_date,
            max_players: self.max_players,
            number_of_players: 0,
            status: TournamentStatus::Upcoming,
            competitor: Vec::new(),
            avatar_url: self.avatar_url,
            created_at: Utc::now(),
        }
    }
}

/// Partial update; `None` leaves a field untouched. The player counter and
/// competitor list are owned by registration and withdrawal.
#[derive(Debug, Clone, Default)]
pub struct TournamentUpdate {
    pub name: Option<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub game_name: Option<String>,
    pub avatar_url: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<TournamentStatus>,
    pub max_players: Option<i32>,
}

impl TournamentUpdate {
    pub fn apply(&self, t: &mut Tournament) {
        if let Some(v) = &self.name {
            t.name = v.clone();
        }
        if let Some(v) = &self.format {
            t.format = Some(v.clone());
        }
        if let Some(v) = &self.description {
            t.description = Some(v.clone());
        }
        if let Some(v) = &self.game_name {
            t.game_name = Some(v.clone());
        }
        if let Some(v) = &self.avatar_url {
            t.avatar_url = Some(v.clone());
        }
        if let Some(v) = self.start_date {
            t.start_date = Some(v);
        }
        if let Some(v) = self.end_date {
            t.end_date = Some(v);
        }
        if let Some(v) = self.status {
            t.status = v;
        }
        if let Some(v) = self.max_players {
            t.max_players = Some(v);
        }
    }

    /// Checks the record as it would look after the update.
    pub fn validate_against(&self, current: &Tournament) -> Result<(), Vec<String>> {
        let mut merged = current.clone();
        self.apply(&mut merged);
        SchemaCheck::new()
            .require(&merged.name, "Tournament name cannot be empty")
            .ensure(
                dates_ordered(merged.start_date, merged.end_date),
                "End date must be after start date",
            )
            .ensure(
                merged.max_players.map_or(true, |m| m >= 1),
                "Maximum players must be at least 1",
            )
            .ensure(
                merged
                    .max_players
                    .map_or(true, |m| m >= merged.number_of_players),
                "Maximum players cannot be lower than the number of registered players",
            )
            .finish()
    }
}

fn dates_ordered(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    match (start, end) {
        (Some(s), Some(e)) => e > s,
        _ => true,
    }
}

/// Tournament as embedded in populated matches and news.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRef {
    pub id: Uuid,
    pub name: String,
    pub format: Option<String>,
    pub status: TournamentStatus,
}

impl From<&Tournament> for TournamentRef {
    fn from(t: &Tournament) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            format: t.format.clone(),
            status: t.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSummary {
    pub id: Uuid,
    pub name: String,
    pub status: TournamentStatus,
    pub number_of_players: i32,
    pub max_players: Option<i32>,
}

impl From<&Tournament> for TournamentSummary {
    fn from(t: &Tournament) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            status: t.status,
            number_of_players: t.number_of_players,
            max_players: t.max_players,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub organizer: Option<UserRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitors: Option<Vec<Competitor>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub name: Option<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub game_name: Option<String>,
    #[serde(default, deserialize_with = "de_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    pub max_players: Option<i32>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTournamentRequest {
    pub name: Option<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub game_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "de_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<TournamentStatus>,
    pub max_players: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<TournamentStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<TournamentStatus>,
    pub format: Option<String>,
    pub game_name: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCompetitorRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub mail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub competitor_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(max_players: Option<i32>) -> NewTournament {
        NewTournament {
            name: "Cup".into(),
            format: None,
            description: None,
            game_name: None,
            organizer_id: Uuid::new_v4(),
            start_date: None,
            end_date: None,
            max_players,
            avatar_url: None,
        }
    }

    #[test]
    fn new_tournaments_start_empty_and_upcoming() {
        let t = draft(Some(8)).into_tournament();
        assert_eq!(t.status, TournamentStatus::Upcoming);
        assert_eq!(t.number_of_players, 0);
        assert!(t.competitor.is_empty());
        assert!(!t.is_full());
    }

    #[test]
    fn full_only_when_capped() {
        let mut t = draft(Some(2)).into_tournament();
        t.number_of_players = 2;
        assert!(t.is_full());

        let mut open = draft(None).into_tournament();
        open.number_of_players = 500;
        assert!(!open.is_full());
    }

    #[test]
    fn update_cannot_cap_below_registrations() {
        let mut t = draft(Some(8)).into_tournament();
        t.number_of_players = 3;

        let shrink = TournamentUpdate {
            max_players: Some(2),
            ..Default::default()
        };
        assert!(shrink.validate_against(&t).is_err());

        let exact = TournamentUpdate {
            max_players: Some(3),
            ..Default::default()
        };
        assert!(exact.validate_against(&t).is_ok());
    }

    #[test]
    fn update_checks_merged_dates() {
        let now = Utc::now();
        let mut t = draft(None).into_tournament();
        t.start_date = Some(now + Duration::days(2));
        t.end_date = Some(now + Duration::days(3));

        let bad = TournamentUpdate {
            end_date: Some(now + Duration::days(1)),
            ..Default::default()
        };
        assert_eq!(
            bad.validate_against(&t).unwrap_err(),
            vec!["End date must be after start date"]
        );
    }
}
