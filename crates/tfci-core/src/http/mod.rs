//! HTTP client for the GitHub REST API

pub mod client;
pub mod models;
pub mod retry;

pub use client::GitHubApiClient;
pub use retry::RetryPolicy;
