use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SchemaCheck, UserCard};

/// A team or player registered in one tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub mail: Option<String>,
    pub tournament_id: Uuid,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewCompetitor {
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub mail: Option<String>,
    pub tournament_id: Uuid,
    pub user_id: Option<Uuid>,
}

impl NewCompetitor {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        SchemaCheck::new()
            .require(&self.name, "Competitor name is required")
            .finish()
    }

    pub fn into_competitor(self) -> Competitor {
        Competitor {
            id: Uuid::new_v4(),
            name: self.name,
            logo_url: self.logo_url,
            description: self.description,
            mail: self.mail,
            tournament_id: self.tournament_id,
            user_id: self.user_id,
        }
    }
}

/// Team as embedded in populated matches.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorRef {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
}

impl From<&Competitor> for CompetitorRef {
    fn from(c: &Competitor) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            logo_url: c.logo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    #[serde(flatten)]
    pub competitor: Competitor,
    pub user: Option<UserCard>,
}
