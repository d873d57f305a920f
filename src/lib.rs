pub mod aggregator;
pub mod api;
pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod monitoring;
pub mod normalize;
pub mod provider;
pub mod scheduler;
