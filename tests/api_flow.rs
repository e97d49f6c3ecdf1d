mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{mixed_page, FakeMovies};
use moviedeck::app::{build_router, AppState};
use moviedeck::favourites::{FavouritesStore, FAVOURITES_KEY};
use moviedeck::repository::MoviesRepository;
use moviedeck::storage::MemoryStorage;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

struct Harness {
    app: Router,
    movies: Arc<FakeMovies>,
    favourites: FavouritesStore,
    storage: Arc<MemoryStorage>,
}

async fn harness(movies: FakeMovies) -> Harness {
    let movies = Arc::new(movies);
    let storage = Arc::new(MemoryStorage::new());
    let favourites = FavouritesStore::load(storage.clone()).await;
    let state = AppState {
        repository: MoviesRepository::new(movies.clone()),
        favourites: favourites.clone(),
    };
    Harness {
        app: build_router(state),
        movies,
        favourites,
        storage,
    }
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request");
    let res = app.clone().oneshot(req).await.expect("router call");
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, body)
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness(FakeMovies::default()).await;
    let (status, body) = send(&h.app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn collection_route_returns_normalized_json() {
    let h = harness(FakeMovies::with_page(mixed_page())).await;
    let (status, body) = send(&h.app, "GET", "/movies/popular?page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.movies.calls(), vec!["popular:2"]);
    let sparse = &body["results"][1];
    assert!(sparse["poster_path"].is_null());
    assert!(sparse["backdrop_path"].is_null());
    assert_eq!(sparse["overview"], "");
    assert_eq!(sparse["vote_count"], 0);
}

#[tokio::test]
async fn blank_search_route_skips_remote() {
    let h = harness(FakeMovies::with_page(mixed_page())).await;
    let (status, body) = send(&h.app, "GET", "/movies/search?query=%20%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "page": 1, "results": [], "total_pages": 0, "total_results": 0 })
    );
    assert!(h.movies.calls().is_empty());

    send(&h.app, "GET", "/movies/search?query=%20Heat%20&page=2").await;
    assert_eq!(h.movies.calls(), vec!["search:Heat:2"]);
}

#[tokio::test]
async fn invalid_movie_id_maps_to_bad_request() {
    let h = harness(FakeMovies::default()).await;
    for uri in ["/movies/0", "/movies/-5/cast", "/movies/0/videos", "/movies/-1/similar"] {
        let (status, body) = send(&h.app, "GET", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["message"], "Invalid movie ID");
    }
    assert!(h.movies.calls().is_empty());
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let h = harness(FakeMovies::failing("Rate limit exceeded")).await;
    let (status, body) = send(&h.app, "GET", "/movies/now_playing").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "Failed to fetch now playing movies: Rate limit exceeded"
    );
}

#[tokio::test]
async fn null_cast_route_returns_empty_array() {
    let h = harness(FakeMovies::default()).await;
    let (status, body) = send(&h.app, "GET", "/movies/603/cast").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn favourites_routes_mutate_and_persist() {
    let h = harness(FakeMovies::default()).await;

    send(&h.app, "PUT", "/favourites/5").await;
    send(&h.app, "PUT", "/favourites/5").await;
    let (status, body) = send(&h.app, "PUT", "/favourites/9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "favourites": [5, 9] }));

    let (_, body) = send(&h.app, "GET", "/favourites/5").await;
    assert_eq!(body, json!({ "id": 5, "favourite": true }));

    let (_, body) = send(&h.app, "DELETE", "/favourites/5").await;
    assert_eq!(body, json!({ "favourites": [9] }));
    let (_, body) = send(&h.app, "DELETE", "/favourites/123").await;
    assert_eq!(body, json!({ "favourites": [9] }));

    h.favourites.flush().await;
    assert_eq!(
        h.storage.snapshot(FAVOURITES_KEY).as_deref(),
        Some(r#"{"state":{"favourites":[9]},"version":0}"#)
    );

    let (_, body) = send(&h.app, "DELETE", "/favourites").await;
    assert_eq!(body, json!({ "favourites": [] }));
    let (_, body) = send(&h.app, "GET", "/favourites").await;
    assert_eq!(body, json!({ "favourites": [] }));
}

#[tokio::test]
async fn favouriting_invalid_id_is_rejected() {
    let h = harness(FakeMovies::default()).await;
    let (status, body) = send(&h.app, "PUT", "/favourites/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid movie ID");
    assert!(h.favourites.is_empty());
}

#[tokio::test]
async fn favourites_survive_a_restart() {
    let storage = Arc::new(MemoryStorage::new());
    let first = FavouritesStore::load(storage.clone()).await;
    first.add(1);
    first.add(2);
    first.flush().await;

    let second = FavouritesStore::load(storage).await;
    assert_eq!(second.favourites(), vec![1, 2]);
}

#[tokio::test]
async fn unparseable_movie_ids_get_json_errors() {
    let h = harness(FakeMovies::default()).await;
    let cases = [
        ("GET", "/movies/abc"),
        ("GET", "/movies/1.5/cast"),
        ("GET", "/movies/99999999999/similar"),
        ("PUT", "/favourites/99999999999"),
        ("DELETE", "/favourites/abc"),
        ("GET", "/favourites/abc"),
    ];
    for (method, uri) in cases {
        let (status, body) = send(&h.app, method, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(
            body,
            json!({ "status": "error", "message": "Invalid movie ID" }),
            "{method} {uri}"
        );
    }
    assert!(h.movies.calls().is_empty());
    assert!(h.favourites.is_empty());
}
