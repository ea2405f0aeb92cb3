//! Public content endpoint.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};

use super::parse_content_type;
use crate::errors::AppError;
use crate::AppState;

/// GET /api/content/{type} - Serve the cached entry for a content type.
///
/// The origin is checked before the cache is read. The CORS header is set on
/// every answer after that, including 404s, so browsers can see "not yet published".
pub async fn get_content(
    State(state): State<AppState>,
    Path(raw_type): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let allow_origin = state.origins.authorize(&headers)?;

    let mut response = match read_cached(&state, &raw_type).await {
        Ok(body) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            body,
        )
            .into_response(),
        Err(e) => e.into_response(),
    };

    let response_headers = response.headers_mut();
    response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    response_headers.insert(header::VARY, HeaderValue::from_static("origin"));

    Ok(response)
}

async fn read_cached(state: &AppState, raw_type: &str) -> Result<String, AppError> {
    let content_type = parse_content_type(raw_type)?;

    state
        .cache
        .get(content_type.key())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No published content for {}", content_type)))
}
