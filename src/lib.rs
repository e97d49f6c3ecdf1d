pub mod app;
pub mod config;
pub mod favourites;
pub mod models;
pub mod repository;
pub mod storage;
pub mod tmdb;
