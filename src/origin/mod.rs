//! Browser origin allow-list for published content.
//!
//! This is CORS policy, not authentication: the `Origin` header is client-supplied
//! and anything outside a browser can send whatever it likes.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::errors::AppError;

/// Origins allowed to read content from a browser.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Check the request's origin and return the value to echo in
    /// `Access-Control-Allow-Origin`. Requests without an origin get `*`.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<HeaderValue, AppError> {
        let Some(origin) = headers.get(header::ORIGIN) else {
            return Ok(HeaderValue::from_static("*"));
        };

        let permitted = origin
            .to_str()
            .map(|o| self.allowed.iter().any(|a| a == o.trim_end_matches('/')))
            .unwrap_or(false);

        if permitted {
            Ok(origin.clone())
        } else {
            tracing::warn!("Rejected request from origin {:?}", origin);
            Err(AppError::Forbidden("Origin not allowed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> OriginPolicy {
        OriginPolicy::new(vec![
            "https://example.dev".to_string(),
            "http://localhost:3000".to_string(),
        ])
    }

    #[test]
    fn test_missing_origin_is_allowed() {
        let value = policy().authorize(&HeaderMap::new()).unwrap();
        assert_eq!(value, "*");
    }

    #[test]
    fn test_allowed_origin_is_echoed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());

        assert_eq!(
            policy().authorize(&headers).unwrap(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_unknown_origin_is_forbidden() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, "https://evil.example".parse().unwrap());

        let err = policy().authorize(&headers).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_empty_policy_only_allows_originless_requests() {
        let policy = OriginPolicy::default();
        let mut headers = HeaderMap::new();
        assert!(policy.authorize(&headers).is_ok());

        headers.insert(header::ORIGIN, "https://example.dev".parse().unwrap());
        assert!(policy.authorize(&headers).is_err());
    }
}
