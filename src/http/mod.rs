//! HTTP client module
//!
//! Shared by the fetcher (public dataset hosts) and the warehouse client
//! (authenticated REST calls). There is no retry, rate limiting or backoff:
//! a failed request fails the run.

mod client;

pub use client::{join_url, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
