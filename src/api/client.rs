use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use super::types::{ApiError, ErrorBody, LOGIN_FAILED, LoginRequest, LoginResponse};
use crate::core::catalog::{Product, ProductDetail};
use crate::core::identity::UserRecord;

/// Client for the request/response endpoints of the farming service.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:5000`).
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign in with an already validated user id.
    ///
    /// A non-success status fails with the server's `error` text (or
    /// "Login failed"); a success without `success && user` is an
    /// `InvalidResponse`.
    pub async fn login(&self, user_id: &str) -> Result<UserRecord, ApiError> {
        info!("Logging in as {}", user_id);
        let response = self
            .client
            .post(format!("{}/user/login", self.base_url))
            .json(&LoginRequest {
                user_id: user_id.to_string(),
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Login response status: {}", status);

        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body.error.unwrap_or_else(|| LOGIN_FAILED.to_string());
            warn!("Login rejected: {} - {}", status.as_u16(), message);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        match body {
            LoginResponse {
                success: true,
                user: Some(user),
            } => {
                info!("Logged in as {} ({})", user.user_id, user.name);
                Ok(user)
            }
            _ => {
                warn!("Login response without a user");
                Err(ApiError::InvalidResponse)
            }
        }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/products").await
    }

    pub async fn get_product(&self, id: u64) -> Result<ProductDetail, ApiError> {
        self.get_json(&format!("/products/{id}")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!("GET {} -> {}", path, status);

        if !status.is_success() {
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("GET {} failed: {} - {}", path, status.as_u16(), err_body);
            let message = serde_json::from_str::<ErrorBody>(&err_body)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("Request failed ({})", status.as_u16()));
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}
