//! Shared-secret authentication for the internal routes.
//!
//! Implements constant-time comparison to mitigate timing attacks.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the internal secret.
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Secret authentication layer function that takes the expected secret as a parameter.
///
/// Without a configured secret every request is rejected.
pub async fn secret_auth_layer(
    expected_secret: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_secret else {
        tracing::warn!("Internal request rejected: no internal secret configured");
        return forbidden_response();
    };

    // Get the secret from the request header
    let provided = request
        .headers()
        .get(INTERNAL_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            // Also check Authorization header as bearer token
            request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        });

    let authorized = provided.is_some_and(|secret| constant_time_compare(secret, &expected));

    if authorized {
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "Internal request rejected: bad secret");
        forbidden_response()
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Generic rejection that does not say what was wrong.
fn forbidden_response() -> Response {
    AppError::Unauthorized("Forbidden".to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-secret-123", "test-secret-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-secret-123", "test-secret-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-secret"));
    }

    #[test]
    fn test_constant_time_compare_empty() {
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("", "not-empty"));
    }
}
