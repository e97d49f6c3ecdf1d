#![allow(dead_code)]

use anyhow::anyhow;
use moviedeck::models::{Cast, Video};
use moviedeck::tmdb::{MovieDetailsPayload, MoviesApi, MoviesPagePayload};
use serde_json::json;
use std::sync::Mutex;

/// Scripted stand-in for TMDB that records every call it receives.
#[derive(Default)]
pub struct FakeMovies {
    pub calls: Mutex<Vec<String>>,
    pub page: MoviesPagePayload,
    pub details: MovieDetailsPayload,
    pub cast: Option<Vec<Cast>>,
    pub videos: Option<Vec<Video>>,
    /// When set, every call fails with this message.
    pub failure: Option<String>,
}

impl FakeMovies {
    pub fn with_page(page: MoviesPagePayload) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl MoviesApi for FakeMovies {
    async fn fetch_popular(&self, page: u32) -> anyhow::Result<MoviesPagePayload> {
        self.record(format!("popular:{page}"))?;
        Ok(self.page.clone())
    }
    async fn fetch_now_playing(&self, page: u32) -> anyhow::Result<MoviesPagePayload> {
        self.record(format!("now_playing:{page}"))?;
        Ok(self.page.clone())
    }
    async fn fetch_upcoming(&self, page: u32) -> anyhow::Result<MoviesPagePayload> {
        self.record(format!("upcoming:{page}"))?;
        Ok(self.page.clone())
    }
    async fn fetch_top_rated(&self, page: u32) -> anyhow::Result<MoviesPagePayload> {
        self.record(format!("top_rated:{page}"))?;
        Ok(self.page.clone())
    }
    async fn search(&self, query: &str, page: u32) -> anyhow::Result<MoviesPagePayload> {
        self.record(format!("search:{query}:{page}"))?;
        Ok(self.page.clone())
    }
    async fn fetch_details(&self, id: i32) -> anyhow::Result<MovieDetailsPayload> {
        self.record(format!("details:{id}"))?;
        Ok(self.details.clone())
    }
    async fn fetch_cast(&self, id: i32) -> anyhow::Result<Option<Vec<Cast>>> {
        self.record(format!("cast:{id}"))?;
        Ok(self.cast.clone())
    }
    async fn fetch_videos(&self, id: i32) -> anyhow::Result<Option<Vec<Video>>> {
        self.record(format!("videos:{id}"))?;
        Ok(self.videos.clone())
    }
    async fn fetch_similar(&self, id: i32, page: u32) -> anyhow::Result<MoviesPagePayload> {
        self.record(format!("similar:{id}:{page}"))?;
        Ok(self.page.clone())
    }
}

/// One complete movie and one with every optional field missing or null.
pub fn mixed_page() -> MoviesPagePayload {
    serde_json::from_value(json!({
        "page": 1,
        "results": [
            {
                "id": 27205,
                "title": "Inception",
                "overview": "A thief who steals corporate secrets.",
                "poster_path": "/inception.jpg",
                "backdrop_path": "/inception-bg.jpg",
                "release_date": "2010-07-15",
                "vote_average": 8.4,
                "vote_count": 36000,
                "genre_ids": [28, 878],
                "popularity": 90.5,
                "adult": false,
                "original_language": "en",
                "original_title": "Inception",
                "video": false
            },
            {
                "id": 2,
                "title": "Sparse",
                "poster_path": null,
                "backdrop_path": "",
                "overview": null,
                "vote_average": null,
                "release_date": "2024-01-01"
            }
        ],
        "total_pages": 3,
        "total_results": 42
    }))
    .expect("page fixture")
}

pub fn sparse_details() -> MovieDetailsPayload {
    serde_json::from_value(json!({
        "id": 550,
        "title": "Fight Club",
        "poster_path": "",
        "overview": null,
        "vote_count": null,
        "genres": null,
        "production_companies": null,
        "runtime": 139,
        "status": "Released"
    }))
    .expect("details fixture")
}
