//! Fetch movies through the repository and print the normalized JSON.
//! Usage:
//!   cargo run --bin tmdb_movies -- list <popular|now_playing|upcoming|top_rated> [pages]
//!   cargo run --bin tmdb_movies -- search <query> [pages]
//!   cargo run --bin tmdb_movies -- movie <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use moviedeck::config::Config;
use moviedeck::models::MoviesResponse;
use moviedeck::repository::MoviesRepository;
use moviedeck::tmdb::{image_sizes, TmdbClient};
use serde_json::json;
use std::env;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Collection {
    Popular,
    NowPlaying,
    Upcoming,
    TopRated,
}

impl FromStr for Collection {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "popular" => Ok(Collection::Popular),
            "now_playing" => Ok(Collection::NowPlaying),
            "upcoming" => Ok(Collection::Upcoming),
            "top_rated" => Ok(Collection::TopRated),
            _ => Err(anyhow!(
                "collection must be one of popular, now_playing, upcoming, top_rated"
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo run --bin tmdb_movies -- list <collection> [pages]");
        eprintln!("       cargo run --bin tmdb_movies -- search <query> [pages]");
        eprintln!("       cargo run --bin tmdb_movies -- movie <tmdb_id>");
        std::process::exit(1);
    }

    let config = Config::from_env()?;
    let client = TmdbClient::new(config.tmdb_api_key, config.tmdb_base_url)?;
    let repo = MoviesRepository::new(Arc::new(client));

    let pages: u32 = match args.get(3) {
        Some(p) => p.parse().context("pages must be a positive integer")?,
        None => 1,
    };

    match args[1].as_str() {
        "list" => {
            let collection = Collection::from_str(&args[2])?;
            print_pages(&repo, pages, |page| {
                let repo = repo.clone();
                async move {
                    match collection {
                        Collection::Popular => repo.popular_movies(Some(page)).await,
                        Collection::NowPlaying => repo.now_playing_movies(Some(page)).await,
                        Collection::Upcoming => repo.upcoming_movies(Some(page)).await,
                        Collection::TopRated => repo.top_rated_movies(Some(page)).await,
                    }
                }
            })
            .await?
        }
        "search" => {
            let query = args[2].clone();
            print_pages(&repo, pages, |page| {
                let repo = repo.clone();
                let query = query.clone();
                async move { repo.search_movies(&query, Some(page)).await }
            })
            .await?
        }
        "movie" => {
            let id: i32 = args[2].parse().context("tmdb_id must be an integer")?;
            print_movie(&repo, id).await?
        }
        other => return Err(anyhow!("unknown command '{}'", other)),
    }

    Ok(())
}

/// Follows `next_page` until `max_pages` pages are printed or the list ends.
async fn print_pages<F, Fut>(repo: &MoviesRepository, max_pages: u32, fetch: F) -> Result<()>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = moviedeck::repository::Result<MoviesResponse>>,
{
    let mut page = Some(1);
    let mut fetched = 0;
    while let Some(current) = page {
        if fetched >= max_pages {
            break;
        }
        let res = fetch(current).await?;
        println!(
            "# page {}/{} ({} results total)",
            res.page, res.total_pages, res.total_results
        );
        for movie in &res.results {
            let poster = repo.image_url(
                movie.poster_path.as_deref(),
                Some(image_sizes::poster::SMALL),
            );
            println!(
                "{}",
                json!({
                    "id": movie.id,
                    "title": movie.title,
                    "release_date": movie.release_date,
                    "vote_average": movie.vote_average,
                    "poster": poster,
                })
            );
        }
        fetched += 1;
        page = res.next_page();
    }
    Ok(())
}

async fn print_movie(repo: &MoviesRepository, id: i32) -> Result<()> {
    let (details, cast, videos) = tokio::try_join!(
        repo.movie_details(id),
        repo.movie_cast(id),
        repo.movie_videos(id),
    )?;
    let cast = cast
        .iter()
        .take(10)
        .map(|c| {
            json!({
                "name": c.name,
                "character": c.character,
                "profile": repo.image_url(c.profile_path.as_deref(), Some(image_sizes::profile::MEDIUM)),
            })
        })
        .collect::<Vec<_>>();
    let out = json!({
        "poster": repo.image_url(details.poster_path.as_deref(), None),
        "backdrop": repo.image_url(details.backdrop_path.as_deref(), Some(image_sizes::backdrop::LARGE)),
        "details": details,
        "cast": cast,
        "videos": videos,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
