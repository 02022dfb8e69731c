use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::identity::UserRecord;

/// Shown when a failed login carries no `error` field.
pub const LOGIN_FAILED: &str = "Login failed";

/// Failures of the plain HTTP endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection refused, DNS, timeout.
    Network(String),
    /// Non-success status. `message` is what the user should see.
    Http { status: u16, message: String },
    /// The body was not the JSON we expected.
    Parse(String),
    /// A success status whose body does not carry what it should.
    InvalidResponse,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {msg}"),
            ApiError::Http { message, .. } => write!(f, "{message}"),
            ApiError::Parse(msg) => write!(f, "Unexpected response: {msg}"),
            ApiError::InvalidResponse => write!(f, "Invalid response from server"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub user_id: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub user: Option<UserRecord>,
}

/// Error body returned by the server on failure.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    pub error: Option<String>,
}
