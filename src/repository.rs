use std::sync::Arc;

use tracing::debug;

use crate::models::{Cast, Movie, MovieDetails, MoviesResponse, Video};
use crate::tmdb::{self, MovieDetailsPayload, MoviePayload, MoviesApi, MoviesPagePayload};

const DEFAULT_PAGE: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Invalid movie ID")]
    InvalidMovieId,

    #[error("{}", upstream_message(.context, .message))]
    Upstream {
        context: &'static str,
        message: String,
    },
}

fn upstream_message(context: &str, message: &str) -> String {
    if message.is_empty() {
        context.to_string()
    } else {
        format!("{context}: {message}")
    }
}

impl RepositoryError {
    fn upstream(context: &'static str, err: anyhow::Error) -> Self {
        RepositoryError::Upstream {
            context,
            message: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Stateless adapter over the remote movie endpoints. Every record leaving
/// here has concrete defaults for the fields TMDB leaves out or nulls.
#[derive(Clone)]
pub struct MoviesRepository {
    api: Arc<dyn MoviesApi>,
}

impl MoviesRepository {
    pub fn new(api: Arc<dyn MoviesApi>) -> Self {
        Self { api }
    }

    pub async fn popular_movies(&self, page: Option<u32>) -> Result<MoviesResponse> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        debug!("Fetching popular movies page {}", page);
        self.api
            .fetch_popular(page)
            .await
            .map(normalize_movies_response)
            .map_err(|e| RepositoryError::upstream("Failed to fetch popular movies", e))
    }

    pub async fn now_playing_movies(&self, page: Option<u32>) -> Result<MoviesResponse> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        debug!("Fetching now playing movies page {}", page);
        self.api
            .fetch_now_playing(page)
            .await
            .map(normalize_movies_response)
            .map_err(|e| RepositoryError::upstream("Failed to fetch now playing movies", e))
    }

    pub async fn upcoming_movies(&self, page: Option<u32>) -> Result<MoviesResponse> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        debug!("Fetching upcoming movies page {}", page);
        self.api
            .fetch_upcoming(page)
            .await
            .map(normalize_movies_response)
            .map_err(|e| RepositoryError::upstream("Failed to fetch upcoming movies", e))
    }

    pub async fn top_rated_movies(&self, page: Option<u32>) -> Result<MoviesResponse> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        debug!("Fetching top rated movies page {}", page);
        self.api
            .fetch_top_rated(page)
            .await
            .map(normalize_movies_response)
            .map_err(|e| RepositoryError::upstream("Failed to fetch top rated movies", e))
    }

    /// Blank queries short-circuit to an empty first page without a request.
    pub async fn search_movies(&self, query: &str, page: Option<u32>) -> Result<MoviesResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(MoviesResponse::empty());
        }
        let page = page.unwrap_or(DEFAULT_PAGE);
        debug!("Searching movies for '{}' page {}", query, page);
        self.api
            .search(query, page)
            .await
            .map(normalize_movies_response)
            .map_err(|e| RepositoryError::upstream("Failed to search movies", e))
    }

    pub async fn movie_details(&self, movie_id: i32) -> Result<MovieDetails> {
        let movie_id = validate_movie_id(movie_id)?;
        debug!("Fetching details for movie {}", movie_id);
        self.api
            .fetch_details(movie_id)
            .await
            .map(normalize_movie_details)
            .map_err(|e| RepositoryError::upstream("Failed to fetch movie details", e))
    }

    pub async fn movie_cast(&self, movie_id: i32) -> Result<Vec<Cast>> {
        let movie_id = validate_movie_id(movie_id)?;
        debug!("Fetching cast for movie {}", movie_id);
        self.api
            .fetch_cast(movie_id)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| RepositoryError::upstream("Failed to fetch movie cast", e))
    }

    pub async fn movie_videos(&self, movie_id: i32) -> Result<Vec<Video>> {
        let movie_id = validate_movie_id(movie_id)?;
        debug!("Fetching videos for movie {}", movie_id);
        self.api
            .fetch_videos(movie_id)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| RepositoryError::upstream("Failed to fetch movie videos", e))
    }

    pub async fn similar_movies(&self, movie_id: i32, page: Option<u32>) -> Result<MoviesResponse> {
        let movie_id = validate_movie_id(movie_id)?;
        let page = page.unwrap_or(DEFAULT_PAGE);
        debug!("Fetching movies similar to {} page {}", movie_id, page);
        self.api
            .fetch_similar(movie_id, page)
            .await
            .map(normalize_movies_response)
            .map_err(|e| RepositoryError::upstream("Failed to fetch similar movies", e))
    }

    pub fn image_url(&self, path: Option<&str>, size: Option<&str>) -> Option<String> {
        tmdb::image_url(path, size)
    }
}

fn validate_movie_id(movie_id: i32) -> Result<i32> {
    if movie_id <= 0 {
        return Err(RepositoryError::InvalidMovieId);
    }
    Ok(movie_id)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// NaN and zero both collapse to 0.0, matching the falsy default.
fn vote_average(value: Option<f64>) -> f64 {
    value.filter(|v| !v.is_nan()).unwrap_or(0.0)
}

fn normalize_movie(movie: MoviePayload) -> Movie {
    Movie {
        id: movie.id.unwrap_or_default(),
        title: movie.title.unwrap_or_default(),
        overview: movie.overview.unwrap_or_default(),
        poster_path: non_empty(movie.poster_path),
        backdrop_path: non_empty(movie.backdrop_path),
        release_date: movie.release_date.unwrap_or_default(),
        vote_average: vote_average(movie.vote_average),
        vote_count: movie.vote_count.unwrap_or(0),
        genre_ids: movie.genre_ids.unwrap_or_default(),
        popularity: movie.popularity,
        adult: movie.adult,
        original_language: movie.original_language,
        original_title: movie.original_title,
        video: movie.video,
    }
}

fn normalize_movies_response(response: MoviesPagePayload) -> MoviesResponse {
    MoviesResponse {
        page: response.page.unwrap_or_default(),
        results: response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(normalize_movie)
            .collect(),
        total_pages: response.total_pages.unwrap_or_default(),
        total_results: response.total_results.unwrap_or_default(),
    }
}

fn normalize_movie_details(details: MovieDetailsPayload) -> MovieDetails {
    MovieDetails {
        id: details.id.unwrap_or_default(),
        title: details.title.unwrap_or_default(),
        overview: details.overview.unwrap_or_default(),
        poster_path: non_empty(details.poster_path),
        backdrop_path: non_empty(details.backdrop_path),
        release_date: details.release_date.unwrap_or_default(),
        vote_average: vote_average(details.vote_average),
        vote_count: details.vote_count.unwrap_or(0),
        popularity: details.popularity,
        adult: details.adult,
        original_language: details.original_language,
        original_title: details.original_title,
        video: details.video,
        imdb_id: details.imdb_id,
        genres: details.genres.unwrap_or_default(),
        runtime: details.runtime,
        budget: details.budget,
        revenue: details.revenue,
        production_companies: details.production_companies.unwrap_or_default(),
        production_countries: details.production_countries.unwrap_or_default(),
        spoken_languages: details.spoken_languages.unwrap_or_default(),
        status: details.status,
        tagline: details.tagline,
        homepage: details.homepage,
    }
}
