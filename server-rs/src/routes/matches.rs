use axum::extract::{Path, State};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::{parse_id, parse_opt_id};
use crate::error::{AppError, AppResult, ResultExt};
use crate::extract::{ApiJson, ApiQuery};
use crate::models::*;
use crate::pagination::{LimitQuery, PageQuery, PageRequest, Window, MAX_LIMIT};
use crate::response::ApiResponse;
use crate::store::{populate, CompetitorStore, MatchFilter, MatchStore, TimeBound, TournamentStore};
use crate::AppState;

const TOURNAMENT_PAGE_LIMIT: u64 = 20;
const UPCOMING_LIMIT: u64 = 10;

fn not_found() -> AppError {
    AppError::NotFound("Match not found".into())
}

/// Both teams must exist and be registered in `tournament_id`.
async fn check_teams(
    state: &AppState,
    tournament_id: Uuid,
    teams: &[Uuid],
    context: &str,
) -> AppResult<()> {
    let found = state
        .store
        .find_competitors(teams)
        .await
        .context(context)?;
    if teams.iter().any(|id| !found.iter().any(|c| c.id == *id)) {
        return Err(AppError::BadRequest(
            "One or both competitors not found".into(),
        ));
    }
    if found.iter().any(|c| c.tournament_id != tournament_id) {
        return Err(AppError::BadRequest(
            "Both competitors must belong to the tournament".into(),
        ));
    }
    Ok(())
}

async fn respond_one(
    state: &AppState,
    game: Match,
    message: &str,
    context: &str,
) -> AppResult<ApiResponse> {
    let view = populate::match_with_refs(state.store.as_ref(), game)
        .await
        .context(context)?;
    Ok(ApiResponse::ok(message, json!({ "match": view })))
}

async fn respond_many(
    state: &AppState,
    filter: &MatchFilter,
    window: Window,
    page: Option<PageRequest>,
    context: &str,
) -> AppResult<ApiResponse> {
    let result = state
        .store
        .list_matches(filter, window)
        .await
        .context(context)?;
    let matches = populate::matches_with_refs(state.store.as_ref(), result.items)
        .await
        .context(context)?;
    let data = match page {
        Some(page) => json!({ "matches": matches, "pagination": page.info(result.total) }),
        None => json!({ "matches": matches }),
    };
    Ok(ApiResponse::ok("Matches fetched successfully", data))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateMatchRequest>,
) -> AppResult<ApiResponse> {
    let (Some(tournament_id), Some(team_a), Some(team_b)) = (
        parse_opt_id(body.tournament_id.as_deref(), "tournament")?,
        parse_opt_id(body.team_a.as_deref(), "team A")?,
        parse_opt_id(body.team_b.as_deref(), "team B")?,
    ) else {
        return Err(AppError::BadRequest(
            "Tournament, team A and team B are required".into(),
        ));
    };

    let context = "Server error while creating match";
    state
        .store
        .find_tournament(tournament_id)
        .await
        .context(context)?
        .ok_or_else(|| AppError::NotFound("Tournament not found".into()))?;

    if team_a == team_b {
        return Err(AppError::BadRequest(
            "A match needs two different competitors".into(),
        ));
    }
    check_teams(&state, tournament_id, &[team_a, team_b], context).await?;

    let game = state
        .store
        .create_match(NewMatch {
            tournament_id,
            team_a,
            team_b,
            scheduled_at: body.scheduled_at,
        })
        .await
        .context(context)?;

    tracing::info!(match_id = %game.id, %tournament_id, "match created");
    let view = populate::match_with_refs(state.store.as_ref(), game)
        .await
        .context(context)?;
    Ok(ApiResponse::created(
        "Match created successfully",
        json!({ "match": view }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MatchQuery>,
) -> AppResult<ApiResponse> {
    let page = PageRequest::new(query.page, query.limit, 10);
    let filter = MatchFilter {
        tournament_id: parse_opt_id(query.tournament_id.as_deref(), "tournament")?,
        status: query.status,
        ..Default::default()
    };
    respond_many(
        &state,
        &filter,
        page.window(),
        Some(page),
        "Server error while fetching matches",
    )
    .await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "match")?;
    let context = "Server error while fetching match";
    let game = state
        .store
        .find_match(id)
        .await
        .context(context)?
        .ok_or_else(not_found)?;
    respond_one(&state, game, "Match fetched successfully", context).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateMatchRequest>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "match")?;
    let update = MatchUpdate {
        tournament_id: parse_opt_id(body.tournament_id.as_deref(), "tournament")?,
        team_a: parse_opt_id(body.team_a.as_deref(), "team A")?,
        team_b: parse_opt_id(body.team_b.as_deref(), "team B")?,
        scheduled_at: body.scheduled_at,
        status: body.status,
        score: body.score,
    };

    let context = "Server error while updating match";
    let current = state
        .store
        .find_match(id)
        .await
        .context(context)?
        .ok_or_else(not_found)?;

    let mut merged = current.clone();
    update.apply(&mut merged);
    if update.tournament_id.is_some() || update.team_a.is_some() || update.team_b.is_some() {
        if merged.team_a.is_some() && merged.team_a == merged.team_b {
            return Err(AppError::BadRequest(
                "A match needs two different competitors".into(),
            ));
        }
        if let Some(tid) = update.tournament_id {
            state
                .store
                .find_tournament(tid)
                .await
                .context(context)?
                .ok_or_else(|| AppError::NotFound("Tournament not found".into()))?;
        }
        let teams: Vec<Uuid> = [merged.team_a, merged.team_b].into_iter().flatten().collect();
        check_teams(&state, merged.tournament_id, &teams, context).await?;
    }

    let game = state
        .store
        .update_match(id, update)
        .await
        .context(context)?
        .ok_or_else(not_found)?;
    respond_one(&state, game, "Match updated successfully", context).await
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "match")?;
    let deleted = state
        .store
        .delete_match(id)
        .await
        .context("Server error while deleting match")?;
    if !deleted {
        return Err(not_found());
    }
    Ok(ApiResponse::message("Match deleted successfully"))
}

pub async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "match")?;
    let context = "Server error while starting match";
    let game = state
        .store
        .update_match(
            id,
            MatchUpdate {
                status: Some(MatchStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .context(context)?
        .ok_or_else(not_found)?;
    respond_one(&state, game, "Match started successfully", context).await
}

pub async fn set_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<MatchResultRequest>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "match")?;
    let (Some(a), Some(b)) = (body.score_a, body.score_b) else {
        return Err(AppError::BadRequest("Both team scores are required".into()));
    };

    let context = "Server error while setting match result";
    let game = state
        .store
        .update_match(
            id,
            MatchUpdate {
                score: Some(Score { a, b }),
                status: Some(MatchStatus::Done),
                ..Default::default()
            },
        )
        .await
        .context(context)?
        .ok_or_else(not_found)?;

    tracing::info!(match_id = %id, score_a = a, score_b = b, "match result recorded");
    respond_one(&state, game, "Match result set successfully", context).await
}

pub async fn reschedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RescheduleRequest>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "match")?;
    let new_date = body
        .new_date
        .ok_or_else(|| AppError::BadRequest("New date is required".into()))?;

    let context = "Server error while rescheduling match";
    let game = state
        .store
        .update_match(
            id,
            MatchUpdate {
                scheduled_at: Some(new_date),
                ..Default::default()
            },
        )
        .await
        .context(context)?
        .ok_or_else(not_found)?;
    respond_one(&state, game, "Match rescheduled successfully", context).await
}

pub async fn by_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse> {
    let tournament_id = parse_id(&tournament_id, "tournament")?;
    let page = PageRequest::new(query.page, query.limit, TOURNAMENT_PAGE_LIMIT);
    let filter = MatchFilter {
        tournament_id: Some(tournament_id),
        ..Default::default()
    };
    respond_many(
        &state,
        &filter,
        page.window(),
        Some(page),
        "Server error while fetching tournament matches",
    )
    .await
}

pub async fn by_competitor(
    State(state): State<AppState>,
    Path(competitor_id): Path<String>,
) -> AppResult<ApiResponse> {
    let competitor_id = parse_id(&competitor_id, "competitor")?;
    let filter = MatchFilter {
        competitor_id: Some(competitor_id),
        ..Default::default()
    };
    respond_many(
        &state,
        &filter,
        Window::all(),
        None,
        "Server error while fetching competitor matches",
    )
    .await
}

pub async fn upcoming(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> AppResult<ApiResponse> {
    let limit = query.limit.unwrap_or(UPCOMING_LIMIT).clamp(1, MAX_LIMIT);
    let filter = MatchFilter {
        status: Some(MatchStatus::Pending),
        scheduled: Some(TimeBound::After(Utc::now())),
        ..Default::default()
    };
    respond_many(
        &state,
        &filter,
        Window::first(limit),
        None,
        "Server error while fetching upcoming matches",
    )
    .await
}

pub async fn ongoing(State(state): State<AppState>) -> AppResult<ApiResponse> {
    let filter = MatchFilter {
        status: Some(MatchStatus::Pending),
        scheduled: Some(TimeBound::NotAfter(Utc::now())),
        ..Default::default()
    };
    respond_many(
        &state,
        &filter,
        Window::all(),
        None,
        "Server error while fetching ongoing matches",
    )
    .await
}
