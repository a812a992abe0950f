pub mod api;
pub mod asset;
pub mod autostack;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod grouping;
pub mod ordering;
pub mod progress;
pub mod submitter;
