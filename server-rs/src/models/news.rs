use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{de_datetime, SchemaCheck, TournamentRef, UnknownVariant, UserRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    #[default]
    Draft,
    Public,
}

impl NewsStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NewsStatus::Draft => "draft",
            NewsStatus::Public => "public",
        }
    }
}

impl FromStr for NewsStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "public" => Ok(Self::Public),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub tournament_id: Option<Uuid>,
    pub images: Vec<String>,
    pub status: NewsStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNews {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub tournament_id: Option<Uuid>,
    pub images: Vec<String>,
}

impl NewNews {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        SchemaCheck::new()
            .require(&self.title, "Title is required")
            .require(&self.content, "Content is required")
            .finish()
    }

    pub fn into_news(self) -> News {
        News {
            id: Uuid::new_v4(),
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            tournament_id: self.tournament_id,
            images: self.images,
            status: NewsStatus::Draft,
            published_at: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tournament_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub status: Option<NewsStatus>,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsUpdate {
    pub fn publish_now() -> Self {
        Self {
            status: Some(NewsStatus::Public),
            published_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn apply(&self, n: &mut News) {
        if let Some(v) = &self.title {
            n.title = v.clone();
        }
        if let Some(v) = &self.content {
            n.content = v.clone();
        }
        if let Some(v) = self.tournament_id {
            n.tournament_id = Some(v);
        }
        if let Some(v) = &self.images {
            n.images = v.clone();
        }
        if let Some(v) = self.status {
            n.status = v;
        }
        if let Some(v) = self.published_at {
            n.published_at = Some(v);
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        SchemaCheck::new()
            .ensure(
                self.title.as_deref().map_or(true, |t| !t.trim().is_empty()),
                "Title is required",
            )
            .ensure(
                self.content.as_deref().map_or(true, |c| !c.trim().is_empty()),
                "Content is required",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsView {
    #[serde(flatten)]
    pub news: News,
    pub author: Option<UserRef>,
    pub tournament: Option<TournamentRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tournament_id: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tournament_id: Option<String>,
    pub images: Option<Vec<String>>,
    pub status: Option<NewsStatus>,
    #[serde(default, deserialize_with = "de_datetime")]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub tournament_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsSearchQuery {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafts_until_published() {
        let mut news = NewNews {
            title: "Finals recap".into(),
            content: "What a series".into(),
            author_id: Uuid::new_v4(),
            tournament_id: None,
            images: vec![],
        }
        .into_news();
        assert_eq!(news.status, NewsStatus::Draft);
        assert!(news.published_at.is_none());

        NewsUpdate::publish_now().apply(&mut news);
        assert_eq!(news.status, NewsStatus::Public);
        assert!(news.published_at.is_some());
    }

    #[test]
    fn update_rejects_blank_title() {
        let update = NewsUpdate {
            title: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap_err(), vec!["Title is required"]);
    }
}
