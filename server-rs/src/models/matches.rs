use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{de_datetime, CompetitorRef, SchemaCheck, TournamentRef, UnknownVariant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Pending,
    Done,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Done => "done",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub a: i32,
    pub b: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub tournament_id: Uuid,
    /// Null once the competitor has been removed.
    pub team_a: Option<Uuid>,
    pub team_b: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: MatchStatus,
    pub score: Score,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, competitor_id: Uuid) -> bool {
        self.team_a == Some(competitor_id) || self.team_b == Some(competitor_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub tournament_id: Uuid,
    pub team_a: Uuid,
    pub team_b: Uuid,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl NewMatch {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        SchemaCheck::new()
            .ensure(
                self.team_a != self.team_b,
                "A match needs two different competitors",
            )
            .finish()
    }

    pub fn into_match(self) -> Match {
        Match {
            id: Uuid::new_v4(),
            tournament_id: self.tournament_id,
            team_a: Some(self.team_a),
            team_b: Some(self.team_b),
            scheduled_at: self.scheduled_at,
            status: MatchStatus::Pending,
            score: Score::default(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchUpdate {
    pub tournament_id: Option<Uuid>,
    pub team_a: Option<Uuid>,
    pub team_b: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: Option<MatchStatus>,
    pub score: Option<Score>,
}

impl MatchUpdate {
    pub fn apply(&self, m: &mut Match) {
        if let Some(v) = self.tournament_id {
            m.tournament_id = v;
        }
        if let Some(v) = self.team_a {
            m.team_a = Some(v);
        }
        if let Some(v) = self.team_b {
            m.team_b = Some(v);
        }
        if let Some(v) = self.scheduled_at {
            m.scheduled_at = Some(v);
        }
        if let Some(v) = self.status {
            m.status = v;
        }
        if let Some(v) = self.score {
            m.score = v;
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let score = self.score.unwrap_or_default();
        SchemaCheck::new()
            .ensure(score.a >= 0 && score.b >= 0, "Scores cannot be negative")
            .ensure(
                !matches!((self.team_a, self.team_b), (Some(a), Some(b)) if a == b),
                "A match needs two different competitors",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchTeams {
    pub a: Option<CompetitorRef>,
    pub b: Option<CompetitorRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub game: Match,
    pub teams: MatchTeams,
    pub tournament: Option<TournamentRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub tournament_id: Option<String>,
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    #[serde(default, deserialize_with = "de_datetime")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    pub tournament_id: Option<String>,
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    #[serde(default, deserialize_with = "de_datetime")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: Option<MatchStatus>,
    pub score: Option<Score>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultRequest {
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    #[serde(default, deserialize_with = "de_datetime")]
    pub new_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub tournament_id: Option<String>,
    pub status: Option<MatchStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_scores_and_mirror_matches() {
        let team = Uuid::new_v4();
        let update = MatchUpdate {
            team_a: Some(team),
            team_b: Some(team),
            score: Some(Score { a: -1, b: 2 }),
            ..Default::default()
        };
        assert_eq!(
            update.validate().unwrap_err(),
            vec![
                "Scores cannot be negative",
                "A match needs two different competitors"
            ]
        );
    }

    #[test]
    fn apply_touches_only_given_fields() {
        let mut m = NewMatch {
            tournament_id: Uuid::new_v4(),
            team_a: Uuid::new_v4(),
            team_b: Uuid::new_v4(),
            scheduled_at: None,
        }
        .into_match();
        let before = m.clone();

        MatchUpdate {
            status: Some(MatchStatus::Done),
            score: Some(Score { a: 2, b: 1 }),
            ..Default::default()
        }
        .apply(&mut m);

        assert_eq!(m.status, MatchStatus::Done);
        assert_eq!(m.score, Score { a: 2, b: 1 });
        assert_eq!(m.team_a, before.team_a);
        assert_eq!(m.tournament_id, before.tournament_id);
    }
}
