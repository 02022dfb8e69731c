//! Plain request/response HTTP calls: login and the product catalog.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::ApiError;
