//! Narration API clients.

pub mod http;

pub use http::HttpNarrationClient;
