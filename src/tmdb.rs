use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{Cast, Genre, ProductionCompany, ProductionCountry, SpokenLanguage, Video};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";
pub const DEFAULT_IMAGE_SIZE: &str = "w500";

/// Size tokens accepted by the TMDB image CDN.
pub mod image_sizes {
    pub mod poster {
        pub const SMALL: &str = "w185";
        pub const MEDIUM: &str = "w342";
        pub const LARGE: &str = "w500";
        pub const ORIGINAL: &str = "original";
    }

    pub mod backdrop {
        pub const SMALL: &str = "w300";
        pub const MEDIUM: &str = "w780";
        pub const LARGE: &str = "w1280";
        pub const ORIGINAL: &str = "original";
    }

    pub mod profile {
        pub const SMALL: &str = "w45";
        pub const MEDIUM: &str = "w185";
        pub const LARGE: &str = "h632";
        pub const ORIGINAL: &str = "original";
    }
}

/// Raw remote operations, one per movie endpoint. Payloads come back exactly
/// as TMDB sent them; normalization happens in the repository.
#[async_trait]
pub trait MoviesApi: Send + Sync {
    async fn fetch_popular(&self, page: u32) -> Result<MoviesPagePayload>;
    async fn fetch_now_playing(&self, page: u32) -> Result<MoviesPagePayload>;
    async fn fetch_upcoming(&self, page: u32) -> Result<MoviesPagePayload>;
    async fn fetch_top_rated(&self, page: u32) -> Result<MoviesPagePayload>;
    async fn search(&self, query: &str, page: u32) -> Result<MoviesPagePayload>;
    async fn fetch_details(&self, id: i32) -> Result<MovieDetailsPayload>;
    async fn fetch_cast(&self, id: i32) -> Result<Option<Vec<Cast>>>;
    async fn fetch_videos(&self, id: i32) -> Result<Option<Vec<Video>>>;
    async fn fetch_similar(&self, id: i32, page: u32) -> Result<MoviesPagePayload>;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MoviePayload {
    pub id: Option<i32>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub genre_ids: Option<Vec<i32>>,
    pub popularity: Option<f64>,
    pub adult: Option<bool>,
    pub original_language: Option<String>,
    pub original_title: Option<String>,
    pub video: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MoviesPagePayload {
    pub page: Option<u32>,
    pub results: Option<Vec<MoviePayload>>,
    pub total_pages: Option<u32>,
    pub total_results: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MovieDetailsPayload {
    pub id: Option<i32>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub popularity: Option<f64>,
    pub adult: Option<bool>,
    pub original_language: Option<String>,
    pub original_title: Option<String>,
    pub video: Option<bool>,
    pub imdb_id: Option<String>,
    pub genres: Option<Vec<Genre>>,
    pub runtime: Option<u32>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub production_companies: Option<Vec<ProductionCompany>>,
    pub production_countries: Option<Vec<ProductionCountry>>,
    pub spoken_languages: Option<Vec<SpokenLanguage>>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub homepage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreditsPayload {
    #[serde(default)]
    cast: Option<Vec<Cast>>,
}

#[derive(Debug, Deserialize)]
struct VideosPayload {
    #[serde(default)]
    results: Option<Vec<Video>>,
}

/// Builds a CDN URL for an image path. Absent or empty paths yield `None`.
pub fn image_url(path: Option<&str>, size: Option<&str>) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    let size = size.unwrap_or(DEFAULT_IMAGE_SIZE);
    Some(format!("{IMAGE_BASE_URL}{size}{path}"))
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let user_agent = format!("moviedeck/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{path}?api_key={}", self.base_url, self.api_key);
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn fetch_page(&self, path: &str, page: u32) -> Result<MoviesPagePayload> {
        let url = self.url(path, &[("page", page.to_string())]);
        self.get_json(path, &url).await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            // The URL carries the api key; report the path only.
            return Err(anyhow!("{} -> {}: {}", path, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl MoviesApi for TmdbClient {
    async fn fetch_popular(&self, page: u32) -> Result<MoviesPagePayload> {
        self.fetch_page("/movie/popular", page).await
    }

    async fn fetch_now_playing(&self, page: u32) -> Result<MoviesPagePayload> {
        self.fetch_page("/movie/now_playing", page).await
    }

    async fn fetch_upcoming(&self, page: u32) -> Result<MoviesPagePayload> {
        self.fetch_page("/movie/upcoming", page).await
    }

    async fn fetch_top_rated(&self, page: u32) -> Result<MoviesPagePayload> {
        self.fetch_page("/movie/top_rated", page).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<MoviesPagePayload> {
        let path = "/search/movie";
        let url = self.url(
            path,
            &[("query", query.to_string()), ("page", page.to_string())],
        );
        self.get_json(path, &url).await
    }

    async fn fetch_details(&self, id: i32) -> Result<MovieDetailsPayload> {
        let path = format!("/movie/{id}");
        let url = self.url(&path, &[]);
        self.get_json(&path, &url).await
    }

    async fn fetch_cast(&self, id: i32) -> Result<Option<Vec<Cast>>> {
        let path = format!("/movie/{id}/credits");
        let url = self.url(&path, &[]);
        let credits: CreditsPayload = self.get_json(&path, &url).await?;
        Ok(credits.cast)
    }

    async fn fetch_videos(&self, id: i32) -> Result<Option<Vec<Video>>> {
        let path = format!("/movie/{id}/videos");
        let url = self.url(&path, &[]);
        let videos: VideosPayload = self.get_json(&path, &url).await?;
        Ok(videos.results)
    }

    async fn fetch_similar(&self, id: i32, page: u32) -> Result<MoviesPagePayload> {
        self.fetch_page(&format!("/movie/{id}/similar"), page).await
    }
}
