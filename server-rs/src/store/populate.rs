//! Embeds referenced records into API views.
//!
//! Each function issues one batched lookup per referenced collection rather
//! than one per record. A dangling reference renders as `null`.

use std::collections::HashMap;

use uuid::Uuid;

use super::{CompetitorStore, Store, StoreResult, TournamentStore, UserStore};
use crate::models::*;

fn unique(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

async fn users_by_id(store: &dyn Store, ids: Vec<Uuid>) -> StoreResult<HashMap<Uuid, User>> {
    Ok(store
        .find_users(&unique(ids))
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

async fn tournaments_by_id(
    store: &dyn Store,
    ids: Vec<Uuid>,
) -> StoreResult<HashMap<Uuid, Tournament>> {
    Ok(store
        .find_tournaments(&unique(ids))
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect())
}

async fn competitors_by_id(
    store: &dyn Store,
    ids: Vec<Uuid>,
) -> StoreResult<HashMap<Uuid, Competitor>> {
    Ok(store
        .find_competitors(&unique(ids))
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect())
}

pub async fn tournaments_with_organizers(
    store: &dyn Store,
    tournaments: Vec<Tournament>,
) -> StoreResult<Vec<TournamentView>> {
    let users = users_by_id(store, tournaments.iter().map(|t| t.organizer_id).collect()).await?;
    Ok(tournaments
        .into_iter()
        .map(|t| TournamentView {
            organizer: users.get(&t.organizer_id).map(UserRef::from),
            competitors: None,
            tournament: t,
        })
        .collect())
}

/// Full detail: organizer plus competitors in registration order.
pub async fn tournament_detail(
    store: &dyn Store,
    tournament: Tournament,
) -> StoreResult<TournamentView> {
    let organizer = store
        .find_user(tournament.organizer_id)
        .await?
        .as_ref()
        .map(UserRef::from);
    let mut found = competitors_by_id(store, tournament.competitor.clone()).await?;
    let competitors = tournament
        .competitor
        .iter()
        .filter_map(|id| found.remove(id))
        .collect();
    Ok(TournamentView {
        tournament,
        organizer,
        competitors: Some(competitors),
    })
}

/// Registered competitors with the account that registered each one.
pub async fn participants(
    store: &dyn Store,
    tournament: &Tournament,
) -> StoreResult<Vec<ParticipantView>> {
    let mut found = competitors_by_id(store, tournament.competitor.clone()).await?;
    let competitors: Vec<Competitor> = tournament
        .competitor
        .iter()
        .filter_map(|id| found.remove(id))
        .collect();
    let users = users_by_id(store, competitors.iter().filter_map(|c| c.user_id).collect()).await?;
    Ok(competitors
        .into_iter()
        .map(|c| ParticipantView {
            user: c.user_id.and_then(|id| users.get(&id)).map(UserCard::from),
            competitor: c,
        })
        .collect())
}

pub async fn matches_with_refs(
    store: &dyn Store,
    matches: Vec<Match>,
) -> StoreResult<Vec<MatchView>> {
    let teams = competitors_by_id(
        store,
        matches.iter().flat_map(|m| [m.team_a, m.team_b]).flatten().collect(),
    )
    .await?;
    let tournaments =
        tournaments_by_id(store, matches.iter().map(|m| m.tournament_id).collect()).await?;

    let team = |id: Option<Uuid>| id.and_then(|id| teams.get(&id)).map(CompetitorRef::from);
    Ok(matches
        .into_iter()
        .map(|m| MatchView {
            teams: MatchTeams {
                a: team(m.team_a),
                b: team(m.team_b),
            },
            tournament: tournaments.get(&m.tournament_id).map(TournamentRef::from),
            game: m,
        })
        .collect())
}

pub async fn match_with_refs(store: &dyn Store, game: Match) -> StoreResult<MatchView> {
    let mut views = matches_with_refs(store, vec![game.clone()]).await?;
    Ok(views.pop().unwrap_or(MatchView {
        game,
        teams: MatchTeams { a: None, b: None },
        tournament: None,
    }))
}

pub async fn news_with_refs(store: &dyn Store, news: Vec<News>) -> StoreResult<Vec<NewsView>> {
    let authors = users_by_id(store, news.iter().map(|n| n.author_id).collect()).await?;
    let tournaments =
        tournaments_by_id(store, news.iter().filter_map(|n| n.tournament_id).collect()).await?;
    Ok(news
        .into_iter()
        .map(|n| NewsView {
            author: authors.get(&n.author_id).map(UserRef::from),
            tournament: n
                .tournament_id
                .and_then(|id| tournaments.get(&id))
                .map(TournamentRef::from),
            news: n,
        })
        .collect())
}

pub async fn news_item_with_refs(store: &dyn Store, news: News) -> StoreResult<NewsView> {
    let mut views = news_with_refs(store, vec![news.clone()]).await?;
    Ok(views.pop().unwrap_or(NewsView {
        news,
        author: None,
        tournament: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RegisterOutcome};

    #[tokio::test]
    async fn detail_keeps_registration_order() {
        let store = MemoryStore::new();
        let organizer = store
            .create_user(NewUser {
                email: "org@example.com".into(),
                full_name: "Org".into(),
                password_hash: "hash".into(),
                role: Role::Organizer,
                avatar_url: None,
            })
            .await
            .unwrap();
        let t = store
            .create_tournament(NewTournament {
                name: "Cup".into(),
                format: None,
                description: None,
                game_name: None,
                organizer_id: organizer.id,
                start_date: None,
                end_date: None,
                max_players: None,
                avatar_url: None,
            })
            .await
            .unwrap();
        for name in ["Zeta", "Alpha", "Mid"] {
            let outcome = store
                .register_competitor(NewCompetitor {
                    name: name.into(),
                    logo_url: None,
                    description: None,
                    mail: None,
                    tournament_id: t.id,
                    user_id: None,
                })
                .await
                .unwrap();
            assert!(matches!(outcome, RegisterOutcome::Registered { .. }));
        }

        let t = store.find_tournament(t.id).await.unwrap().unwrap();
        let view = tournament_detail(&store, t).await.unwrap();
        let names: Vec<_> = view
            .competitors
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
        assert_eq!(view.organizer.unwrap().full_name, "Org");
    }
}
