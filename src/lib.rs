pub mod api;
pub mod config;
pub mod downloader;
pub mod engine;
pub mod observability;
pub mod tasks;
pub mod worker;
