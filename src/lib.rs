//! End-to-end checks for OAuth2-protected playlist endpoints
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod runner;
pub mod scenarios;
pub mod token;
