use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Method},
    middleware as axum_mw,
    routing::{get, patch, post, put},
    BoxError, Router,
};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod response;
pub mod routes;
pub mod store;

use config::Config;
use error::AppError;
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(origins)
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::internal(err)
    }
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}

pub fn build_router(state: AppState) -> Router {
    let auth = || axum_mw::from_fn_with_state(state.clone(), middleware::auth::authenticate);
    let organizer = || axum_mw::from_fn(middleware::roles::require_organizer);

    // --- Auth routes ---
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout).layer(auth()))
        .route(
            "/profile",
            get(routes::auth::get_profile)
                .put(routes::auth::update_profile)
                .layer(auth()),
        )
        .route(
            "/change-password",
            put(routes::auth::change_password).layer(auth()),
        );

    // --- Tournament routes ---
    let tournament_routes = Router::new()
        .route("/", get(routes::tournaments::list))
        .route(
            "/",
            post(routes::tournaments::create)
                .layer(organizer())
                .layer(auth()),
        )
        .route("/upcoming", get(routes::tournaments::upcoming))
        .route("/ongoing", get(routes::tournaments::ongoing))
        .route(
            "/organizer/:organizerId",
            get(routes::tournaments::by_organizer),
        )
        .route("/:id", get(routes::tournaments::get))
        .route(
            "/:id",
            put(routes::tournaments::update)
                .delete(routes::tournaments::delete)
                .layer(organizer())
                .layer(auth()),
        )
        .route(
            "/:id/status",
            patch(routes::tournaments::update_status)
                .layer(organizer())
                .layer(auth()),
        )
        .route(
            "/:id/register",
            post(routes::tournaments::register).layer(auth()),
        )
        .route(
            "/:id/withdraw",
            post(routes::tournaments::withdraw).layer(auth()),
        )
        .route(
            "/:id/participants",
            get(routes::tournaments::participants),
        );

    // --- Match routes ---
    let match_routes = Router::new()
        .route("/", get(routes::matches::list))
        .route(
            "/",
            post(routes::matches::create)
                .layer(organizer())
                .layer(auth()),
        )
        .route("/upcoming", get(routes::matches::upcoming))
        .route("/ongoing", get(routes::matches::ongoing))
        .route(
            "/tournament/:tournamentId",
            get(routes::matches::by_tournament),
        )
        .route(
            "/competitor/:competitorId",
            get(routes::matches::by_competitor),
        )
        .route("/:id", get(routes::matches::get))
        .route(
            "/:id",
            put(routes::matches::update)
                .delete(routes::matches::delete)
                .layer(organizer())
                .layer(auth()),
        )
        .route(
            "/:id/start",
            post(routes::matches::start).layer(organizer()).layer(auth()),
        )
        .route(
            "/:id/result",
            post(routes::matches::set_result)
                .layer(organizer())
                .layer(auth()),
        )
        .route(
            "/:id/reschedule",
            post(routes::matches::reschedule)
                .layer(organizer())
                .layer(auth()),
        );

    // --- News routes ---
    let news_routes = Router::new()
        .route("/", get(routes::news::list))
        .route(
            "/",
            post(routes::news::create).layer(organizer()).layer(auth()),
        )
        .route("/featured", get(routes::news::featured))
        .route("/search", get(routes::news::search))
        .route(
            "/tournament/:tournamentId",
            get(routes::news::by_tournament),
        )
        .route("/author/:authorId", get(routes::news::by_author))
        .route("/:id", get(routes::news::get))
        .route(
            "/:id",
            put(routes::news::update)
                .delete(routes::news::delete)
                .layer(organizer())
                .layer(auth()),
        )
        .route(
            "/:id/publish",
            post(routes::news::publish).layer(organizer()).layer(auth()),
        );

    // --- Compose full API ---
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tournaments", tournament_routes)
        .nest("/matches", match_routes)
        .nest("/news", news_routes);

    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    Router::new()
        .nest("/api", api)
        .route("/health", get(routes::health::health))
        .fallback(route_not_found)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(timeout),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
