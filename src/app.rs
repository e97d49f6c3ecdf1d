use crate::config::Config;
use crate::favourites::FavouritesStore;
use crate::models::{Cast, MovieDetails, MoviesResponse, Video};
use crate::repository::{MoviesRepository, RepositoryError};
use crate::storage::FileStorage;
use crate::tmdb::TmdbClient;
use anyhow::Result;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub repository: MoviesRepository,
    pub favourites: FavouritesStore,
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
    page: Option<u32>,
}

/// Movie id path segment. Anything that does not parse as an `i32` is
/// answered like any other invalid id.
struct MovieId(i32);

#[async_trait]
impl<S> FromRequestParts<S> for MovieId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match Path::<i32>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(MovieId(id)),
            Err(rejection) => {
                debug!("Unparseable movie id in {}: {}", parts.uri.path(), rejection.body_text());
                Err(error_response(RepositoryError::InvalidMovieId))
            }
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb = TmdbClient::new(config.tmdb_api_key, config.tmdb_base_url)?;
    let repository = MoviesRepository::new(Arc::new(tmdb));

    let storage = FileStorage::open(&config.data_dir).await?;
    info!("Persisting favourites under {}", storage.dir().display());
    let favourites = FavouritesStore::load(Arc::new(storage)).await;

    let state = AppState {
        repository,
        favourites: favourites.clone(),
    };
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    favourites.flush().await;
    info!("Favourites flushed, bye");
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies/popular", get(popular))
        .route("/movies/now_playing", get(now_playing))
        .route("/movies/upcoming", get(upcoming))
        .route("/movies/top_rated", get(top_rated))
        .route("/movies/search", get(search))
        .route("/movies/:id", get(details))
        .route("/movies/:id/cast", get(cast))
        .route("/movies/:id/videos", get(videos))
        .route("/movies/:id/similar", get(similar))
        .route("/favourites", get(list_favourites).delete(clear_favourites))
        .route(
            "/favourites/:id",
            get(favourite_status)
                .put(add_favourite)
                .delete(remove_favourite),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

fn error_response(err: RepositoryError) -> ApiError {
    let status = match &err {
        RepositoryError::InvalidMovieId => {
            warn!("Rejected request: {}", err);
            StatusCode::BAD_REQUEST
        }
        RepositoryError::Upstream { .. } => {
            error!("{}", err);
            StatusCode::BAD_GATEWAY
        }
    };
    (
        status,
        Json(json!({ "status": "error", "message": err.to_string() })),
    )
}

async fn popular(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<MoviesResponse> {
    state
        .repository
        .popular_movies(q.page)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn now_playing(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<MoviesResponse> {
    state
        .repository
        .now_playing_movies(q.page)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn upcoming(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<MoviesResponse> {
    state
        .repository
        .upcoming_movies(q.page)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn top_rated(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<MoviesResponse> {
    state
        .repository
        .top_rated_movies(q.page)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<MoviesResponse> {
    state
        .repository
        .search_movies(&q.query, q.page)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn details(State(state): State<AppState>, MovieId(id): MovieId) -> ApiResult<MovieDetails> {
    state
        .repository
        .movie_details(id)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn cast(State(state): State<AppState>, MovieId(id): MovieId) -> ApiResult<Vec<Cast>> {
    state
        .repository
        .movie_cast(id)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn videos(State(state): State<AppState>, MovieId(id): MovieId) -> ApiResult<Vec<Video>> {
    state
        .repository
        .movie_videos(id)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn similar(
    State(state): State<AppState>,
    MovieId(id): MovieId,
    Query(q): Query<PageQuery>,
) -> ApiResult<MoviesResponse> {
    state
        .repository
        .similar_movies(id, q.page)
        .await
        .map(Json)
        .map_err(error_response)
}

fn favourites_body(store: &FavouritesStore) -> Json<Value> {
    Json(json!({ "favourites": store.favourites() }))
}

async fn list_favourites(State(state): State<AppState>) -> Json<Value> {
    favourites_body(&state.favourites)
}

async fn favourite_status(State(state): State<AppState>, MovieId(id): MovieId) -> Json<Value> {
    Json(json!({ "id": id, "favourite": state.favourites.is_favourite(id) }))
}

async fn add_favourite(
    State(state): State<AppState>,
    MovieId(id): MovieId,
) -> std::result::Result<Json<Value>, ApiError> {
    if id <= 0 {
        return Err(error_response(RepositoryError::InvalidMovieId));
    }
    state.favourites.add(id);
    Ok(favourites_body(&state.favourites))
}

async fn remove_favourite(State(state): State<AppState>, MovieId(id): MovieId) -> Json<Value> {
    state.favourites.remove(id);
    favourites_body(&state.favourites)
}

async fn clear_favourites(State(state): State<AppState>) -> Json<Value> {
    state.favourites.clear();
    favourites_body(&state.favourites)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
