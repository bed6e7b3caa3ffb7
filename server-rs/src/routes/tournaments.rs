use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::Utc;
use serde_json::json;

use super::{ensure_owner, parse_id};
use crate::error::{AppError, AppResult, ResultExt};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::pagination::{PageRequest, Window};
use crate::response::ApiResponse;
use crate::store::{
    populate, CompetitorStore, RegisterOutcome, TimeBound, TournamentFilter, TournamentOrder,
    TournamentStore, WithdrawOutcome,
};
use crate::AppState;

const UPCOMING_LIMIT: u64 = 10;

async fn load(state: &AppState, id: uuid::Uuid, context: &str) -> AppResult<Tournament> {
    state
        .store
        .find_tournament(id)
        .await
        .context(context)?
        .ok_or_else(|| AppError::NotFound("Tournament not found".into()))
}

async fn single(state: &AppState, tournament: Tournament, context: &str) -> AppResult<TournamentView> {
    populate::tournaments_with_organizers(state.store.as_ref(), vec![tournament])
        .await
        .context(context)?
        .pop()
        .ok_or_else(|| AppError::internal("populate returned no tournament"))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateTournamentRequest>,
) -> AppResult<ApiResponse> {
    let name = clean(body.name)
        .ok_or_else(|| AppError::BadRequest("Tournament name is required".into()))?;

    if let (Some(start), Some(end)) = (body.start_date, body.end_date) {
        if end <= start {
            return Err(AppError::BadRequest(
                "End date must be after start date".into(),
            ));
        }
    }
    if body.start_date.is_some_and(|start| start <= Utc::now()) {
        return Err(AppError::BadRequest(
            "Start date must be in the future".into(),
        ));
    }
    if body.max_players.is_some_and(|m| m < 1) {
        return Err(AppError::BadRequest(
            "Maximum players must be at least 1".into(),
        ));
    }

    let context = "Server error while creating tournament";
    let tournament = state
        .store
        .create_tournament(NewTournament {
            name,
            format: clean(body.format),
            description: clean(body.description),
            game_name: clean(body.game_name),
            organizer_id: user.id,
            start_date: body.start_date,
            end_date: body.end_date,
            max_players: body.max_players,
            avatar_url: clean(body.avatar_url),
        })
        .await
        .context(context)?;

    tracing::info!(tournament_id = %tournament.id, organizer_id = %user.id, "tournament created");
    let view = single(&state, tournament, context).await?;
    Ok(ApiResponse::created(
        "Tournament created successfully",
        json!({ "tournament": view }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TournamentQuery>,
) -> AppResult<ApiResponse> {
    let page = PageRequest::new(query.page, query.limit, 10);
    let filter = TournamentFilter {
        status: query.status,
        format: clean(query.format),
        game_name: clean(query.game_name),
        search: clean(query.search),
        ..Default::default()
    };

    let context = "Server error while fetching tournaments";
    let result = state
        .store
        .list_tournaments(&filter, page.window())
        .await
        .context(context)?;
    let tournaments = populate::tournaments_with_organizers(state.store.as_ref(), result.items)
        .await
        .context(context)?;

    Ok(ApiResponse::ok(
        "Tournaments fetched successfully",
        json!({ "tournaments": tournaments, "pagination": page.info(result.total) }),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "tournament")?;
    let context = "Server error while fetching tournament";
    let tournament = load(&state, id, context).await?;
    let view = populate::tournament_detail(state.store.as_ref(), tournament)
        .await
        .context(context)?;

    Ok(ApiResponse::ok(
        "Tournament fetched successfully",
        json!({ "tournament": view }),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateTournamentRequest>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "tournament")?;
    let context = "Server error while updating tournament";
    let current = load(&state, id, context).await?;
    ensure_owner(&user, &current)?;

    let update = TournamentUpdate {
        // Kept even when blank so the record check can reject it.
        name: body.name.map(|n| n.trim().to_string()),
        format: clean(body.format),
        description: clean(body.description),
        game_name: clean(body.game_name),
        avatar_url: clean(body.avatar_url),
        start_date: body.start_date,
        end_date: body.end_date,
        status: body.status,
        max_players: body.max_players,
    };
    let tournament = state
        .store
        .update_tournament(id, update)
        .await
        .context(context)?
        .ok_or_else(|| AppError::NotFound("Tournament not found".into()))?;

    let view = single(&state, tournament, context).await?;
    Ok(ApiResponse::ok(
        "Tournament updated successfully",
        json!({ "tournament": view }),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "tournament")?;
    let context = "Server error while deleting tournament";
    let current = load(&state, id, context).await?;
    ensure_owner(&user, &current)?;

    state
        .store
        .delete_tournament(id)
        .await
        .context(context)?
        .ok_or_else(|| AppError::NotFound("Tournament not found".into()))?;

    tracing::info!(tournament_id = %id, "tournament deleted");
    Ok(ApiResponse::message("Tournament deleted successfully"))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "tournament")?;
    let status = body
        .status
        .ok_or_else(|| AppError::BadRequest("Status is required".into()))?;
    let context = "Server error while updating tournament status";
    let current = load(&state, id, context).await?;
    ensure_owner(&user, &current)?;

    let tournament = state
        .store
        .update_tournament(
            id,
            TournamentUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
        .context(context)?
        .ok_or_else(|| AppError::NotFound("Tournament not found".into()))?;

    let view = single(&state, tournament, context).await?;
    Ok(ApiResponse::ok(
        "Tournament status updated successfully",
        json!({ "tournament": view }),
    ))
}

pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RegisterCompetitorRequest>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "tournament")?;
    let context = "Server error during tournament registration";
    let tournament = load(&state, id, context).await?;

    // Precise messages up front; the store re-checks atomically.
    if tournament.status != TournamentStatus::Upcoming {
        return Err(AppError::BadRequest(
            "Tournament is not open for registration".into(),
        ));
    }
    if tournament.is_full() {
        return Err(AppError::BadRequest("Tournament is full".into()));
    }
    let existing = state
        .store
        .find_registration(id, user.id)
        .await
        .context(context)?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "You are already registered for this tournament".into(),
        ));
    }

    let name = clean(body.name)
        .or_else(|| clean(Some(user.full_name.clone())))
        .ok_or_else(|| AppError::BadRequest("Team name is required".into()))?;

    let outcome = state
        .store
        .register_competitor(NewCompetitor {
            name,
            logo_url: clean(body.logo_url),
            description: clean(body.description),
            mail: clean(body.mail).or_else(|| Some(user.email.clone())),
            tournament_id: id,
            user_id: Some(user.id),
        })
        .await
        .context(context)?;

    match outcome {
        RegisterOutcome::Registered {
            competitor,
            tournament,
        } => {
            tracing::info!(
                tournament_id = %tournament.id,
                competitor_id = %competitor.id,
                players = tournament.number_of_players,
                "competitor registered"
            );
            Ok(ApiResponse::created(
                "Successfully registered for tournament",
                json!({ "competitor": competitor, "tournament": tournament }),
            ))
        }
        RegisterOutcome::TournamentNotFound => {
            Err(AppError::NotFound("Tournament not found".into()))
        }
        RegisterOutcome::NotOpen => Err(AppError::BadRequest(
            "Tournament is not open for registration".into(),
        )),
        RegisterOutcome::Full => Err(AppError::BadRequest("Tournament is full".into())),
        RegisterOutcome::AlreadyRegistered => Err(AppError::BadRequest(
            "You are already registered for this tournament".into(),
        )),
    }
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<WithdrawRequest>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "tournament")?;
    let competitor_id = body
        .competitor_id
        .as_deref()
        .and_then(|raw| uuid::Uuid::parse_str(raw.trim()).ok())
        .ok_or_else(|| AppError::BadRequest("Valid competitorId is required to withdraw".into()))?;

    let context = "Server error during tournament withdrawal";
    load(&state, id, context).await?;
    let competitor = state
        .store
        .find_competitor(competitor_id)
        .await
        .context(context)?
        .ok_or_else(|| AppError::NotFound("Competitor not found".into()))?;

    if competitor.tournament_id != id {
        return Err(AppError::BadRequest(
            "Competitor does not belong to this tournament".into(),
        ));
    }
    if competitor.user_id != Some(user.id) && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "You can only withdraw your own registration".into(),
        ));
    }

    match state
        .store
        .withdraw_competitor(id, competitor_id)
        .await
        .context(context)?
    {
        WithdrawOutcome::Withdrawn(tournament) => {
            tracing::info!(tournament_id = %id, %competitor_id, "competitor withdrew");
            Ok(ApiResponse::ok(
                "Successfully withdrew from tournament",
                json!({ "tournament": tournament }),
            ))
        }
        WithdrawOutcome::NotRegistered => Err(AppError::BadRequest(
            "Competitor is not registered for this tournament".into(),
        )),
    }
}

pub async fn participants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = parse_id(&id, "tournament")?;
    let context = "Server error while fetching participants";
    let tournament = load(&state, id, context).await?;
    let participants = populate::participants(state.store.as_ref(), &tournament)
        .await
        .context(context)?;

    Ok(ApiResponse::ok(
        "Participants fetched successfully",
        json!({
            "total": participants.len(),
            "competitors": participants,
            "tournament": TournamentSummary::from(&tournament),
        }),
    ))
}

pub async fn by_organizer(
    State(state): State<AppState>,
    Path(organizer_id): Path<String>,
) -> AppResult<ApiResponse> {
    let organizer_id = parse_id(&organizer_id, "organizer")?;
    let filter = TournamentFilter {
        organizer_id: Some(organizer_id),
        ..Default::default()
    };
    fetch_all(
        &state,
        &filter,
        Window::all(),
        "Server error while fetching organizer tournaments",
    )
    .await
}

pub async fn upcoming(State(state): State<AppState>) -> AppResult<ApiResponse> {
    let filter = TournamentFilter {
        status: Some(TournamentStatus::Upcoming),
        starts: Some(TimeBound::NotBefore(Utc::now())),
        order: TournamentOrder::StartDate,
        ..Default::default()
    };
    fetch_all(
        &state,
        &filter,
        Window::first(UPCOMING_LIMIT),
        "Server error while fetching upcoming tournaments",
    )
    .await
}

pub async fn ongoing(State(state): State<AppState>) -> AppResult<ApiResponse> {
    let filter = TournamentFilter {
        status: Some(TournamentStatus::Ongoing),
        starts: Some(TimeBound::NotAfter(Utc::now())),
        order: TournamentOrder::StartDate,
        ..Default::default()
    };
    fetch_all(
        &state,
        &filter,
        Window::all(),
        "Server error while fetching ongoing tournaments",
    )
    .await
}

async fn fetch_all(
    state: &AppState,
    filter: &TournamentFilter,
    window: Window,
    context: &str,
) -> AppResult<ApiResponse> {
    let result = state
        .store
        .list_tournaments(filter, window)
        .await
        .context(context)?;
    let tournaments = populate::tournaments_with_organizers(state.store.as_ref(), result.items)
        .await
        .context(context)?;
    Ok(ApiResponse::ok(
        "Tournaments fetched successfully",
        json!({ "tournaments": tournaments }),
    ))
}
