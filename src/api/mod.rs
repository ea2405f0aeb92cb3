//! REST API module.
//!
//! Public routes serve published content and accept contact messages; internal
//! routes publish, rebuild and inspect content behind the shared secret.

mod contact;
mod content;
mod internal;

pub use contact::*;
pub use content::*;
pub use internal::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::ContentType;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// `?limit=` query for listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

impl ListQuery {
    const DEFAULT_LIMIT: i64 = 20;
    const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// Resolve a content type from its path segment.
fn parse_content_type(raw: &str) -> Result<ContentType, AppError> {
    raw.parse().map_err(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_limit_bounds() {
        assert_eq!(ListQuery::default().limit(), 20);
        assert_eq!(ListQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(ListQuery { limit: Some(5) }.limit(), 5);
        assert_eq!(ListQuery { limit: Some(1000) }.limit(), 100);
    }

    #[test]
    fn test_unknown_content_type_is_not_found() {
        assert!(matches!(
            parse_content_type("blog"),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(parse_content_type("about").unwrap(), ContentType::About);
    }
}
