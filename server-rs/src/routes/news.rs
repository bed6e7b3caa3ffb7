use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use super::{parse_id, parse_opt_id};
use crate::error::{AppError, AppResult, ResultExt};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::pagination::{LimitQuery, PageQuery, PageRequest, Window, MAX_LIMIT};
use crate::response::ApiResponse;
use crate::store::{populate, NewsFilter, NewsStore, TournamentStore};
use crate::AppState;

const FEATURED_LIMIT: u64 = 5;

fn not_found() -> AppError {
    AppError::NotFound("News article not found".into())
}

/// Unlike the other resources, a malformed news id reads as "not found".
fn news_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found())
}

fn clean_images(images: Vec<String>) -> Vec<String> {
    images.into_iter().filter_map(|i| clean(Some(i))).collect()
}

async fn ensure_tournament(state: &AppState, id: Option<Uuid>, context: &str) -> AppResult<()> {
    if let Some(id) = id {
        state
            .store
            .find_tournament(id)
            .await
            .context(context)?
            .ok_or_else(|| AppError::NotFound("Tournament not found".into()))?;
    }
    Ok(())
}

async fn respond_one(
    state: &AppState,
    news: News,
    message: &str,
    context: &str,
) -> AppResult<ApiResponse> {
    let view = populate::news_item_with_refs(state.store.as_ref(), news)
        .await
        .context(context)?;
    Ok(ApiResponse::ok(message, json!({ "news": view })))
}

async fn respond_page(
    state: &AppState,
    filter: &NewsFilter,
    page: PageRequest,
    context: &str,
) -> AppResult<ApiResponse> {
    let result = state
        .store
        .list_news(filter, page.window())
        .await
        .context(context)?;
    let news = populate::news_with_refs(state.store.as_ref(), result.items)
        .await
        .context(context)?;
    Ok(ApiResponse::ok(
        "News fetched successfully",
        json!({ "news": news, "pagination": page.info(result.total) }),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateNewsRequest>,
) -> AppResult<ApiResponse> {
    let tournament_id = parse_opt_id(body.tournament_id.as_deref(), "tournament")?;
    let context = "Server error while creating news article";
    ensure_tournament(&state, tournament_id, context).await?;

    let news = state
        .store
        .create_news(NewNews {
            title: clean(body.title).unwrap_or_default(),
            content: clean(body.content).unwrap_or_default(),
            author_id: user.id,
            tournament_id,
            images: clean_images(body.images),
        })
        .await
        .context(context)?;

    tracing::info!(news_id = %news.id, author_id = %user.id, "news article created");
    let view = populate::news_item_with_refs(state.store.as_ref(), news)
        .await
        .context(context)?;
    Ok(ApiResponse::created(
        "News article created successfully",
        json!({ "news": view }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NewsQuery>,
) -> AppResult<ApiResponse> {
    let page = PageRequest::new(query.page, query.limit, 10);
    let filter = NewsFilter {
        status: Some(NewsStatus::Public),
        tournament_id: parse_opt_id(query.tournament_id.as_deref(), "tournament")?,
        search: clean(query.search),
        ..Default::default()
    };
    respond_page(&state, &filter, page, "Server error while fetching news").await
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = news_id(&id)?;
    let context = "Server error while fetching news article";
    let news = state
        .store
        .find_news(id)
        .await
        .context(context)?
        .ok_or_else(not_found)?;
    respond_one(&state, news, "News article fetched successfully", context).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateNewsRequest>,
) -> AppResult<ApiResponse> {
    let id = news_id(&id)?;
    let context = "Server error while updating news article";
    let tournament_id = parse_opt_id(body.tournament_id.as_deref(), "tournament")?;
    ensure_tournament(&state, tournament_id, context).await?;

    let update = NewsUpdate {
        title: body.title.map(|t| t.trim().to_string()),
        content: body.content.map(|c| c.trim().to_string()),
        tournament_id,
        images: body.images.map(clean_images),
        status: body.status,
        published_at: body.published_at,
    };
    let news = state
        .store
        .update_news(id, update)
        .await
        .context(context)?
        .ok_or_else(not_found)?;
    respond_one(&state, news, "News article updated successfully", context).await
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = news_id(&id)?;
    let deleted = state
        .store
        .delete_news(id)
        .await
        .context("Server error while deleting news article")?;
    if !deleted {
        return Err(not_found());
    }
    Ok(ApiResponse::message("News article deleted successfully"))
}

pub async fn publish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse> {
    let id = news_id(&id)?;
    let context = "Server error while publishing news article";
    let news = state
        .store
        .update_news(id, NewsUpdate::publish_now())
        .await
        .context(context)?
        .ok_or_else(not_found)?;

    tracing::info!(news_id = %id, "news article published");
    respond_one(&state, news, "News article published successfully", context).await
}

pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NewsSearchQuery>,
) -> AppResult<ApiResponse> {
    let q = clean(query.q)
        .ok_or_else(|| AppError::BadRequest("Search query is required".into()))?;
    let page = PageRequest::new(query.page, query.limit, 10);
    let filter = NewsFilter {
        status: Some(NewsStatus::Public),
        search: Some(q),
        ..Default::default()
    };
    respond_page(&state, &filter, page, "Server error while searching news").await
}

pub async fn by_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse> {
    let tournament_id = parse_id(&tournament_id, "tournament")?;
    let page = PageRequest::new(query.page, query.limit, 10);
    let filter = NewsFilter {
        status: Some(NewsStatus::Public),
        tournament_id: Some(tournament_id),
        ..Default::default()
    };
    respond_page(
        &state,
        &filter,
        page,
        "Server error while fetching tournament news",
    )
    .await
}

pub async fn by_author(
    State(state): State<AppState>,
    Path(author_id): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse> {
    let author_id = parse_id(&author_id, "author")?;
    let page = PageRequest::new(query.page, query.limit, 10);
    let filter = NewsFilter {
        author_id: Some(author_id),
        ..Default::default()
    };
    respond_page(&state, &filter, page, "Server error while fetching author news").await
}

pub async fn featured(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> AppResult<ApiResponse> {
    let limit = query.limit.unwrap_or(FEATURED_LIMIT).clamp(1, MAX_LIMIT);
    let filter = NewsFilter {
        status: Some(NewsStatus::Public),
        ..Default::default()
    };
    let context = "Server error while fetching featured news";
    let result = state
        .store
        .list_news(&filter, Window::first(limit))
        .await
        .context(context)?;
    let news = populate::news_with_refs(state.store.as_ref(), result.items)
        .await
        .context(context)?;
    Ok(ApiResponse::ok(
        "Featured news fetched successfully",
        json!({ "news": news }),
    ))
}
