//! Internal content management endpoints. All routes here sit behind the
//! shared-secret layer.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use super::{parse_content_type, success, ApiResult, ListQuery};
use crate::cache;
use crate::errors::AppError;
use crate::models::{CacheEntry, ContactMessage, ContentVersion, PublishContentRequest};
use crate::AppState;

/// Response for a successful publish.
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub success: bool,
    pub stored: bool,
    pub version: i64,
}

#[derive(Debug, Serialize)]
pub struct ContactMessageList {
    pub total: i64,
    pub messages: Vec<ContactMessage>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResult {
    pub invalidated: bool,
}

/// POST /api/internal/content/{type} - Publish a new version.
///
/// The version is appended to the content store first, then written to the
/// cache. If the cache write fails the stored version can be pushed again
/// through the rebuild route.
pub async fn publish_content(
    State(state): State<AppState>,
    Path(raw_type): Path<String>,
    body: Bytes,
) -> Result<Json<PublishResponse>, AppError> {
    let content_type = parse_content_type(&raw_type)?;

    let request: PublishContentRequest = serde_json::from_slice(&body)?;

    let repo = state.store.repository().await?;
    let stored = repo
        .append_content_version(content_type, &request.data)
        .await?;
    let version = stored.version;

    cache::store_entry(
        state.cache.as_ref(),
        content_type.key(),
        &CacheEntry::from(stored),
    )
    .await?;

    tracing::info!(content_type = %content_type, version, "Content published");

    Ok(Json(PublishResponse {
        success: true,
        stored: true,
        version,
    }))
}

/// DELETE /api/internal/content/{type} - Drop the cached entry.
pub async fn invalidate_content(
    State(state): State<AppState>,
    Path(raw_type): Path<String>,
) -> ApiResult<InvalidateResult> {
    let content_type = parse_content_type(&raw_type)?;

    let invalidated = state.cache.delete(content_type.key()).await?;
    tracing::info!(content_type = %content_type, invalidated, "Cache invalidated");

    success(InvalidateResult { invalidated })
}

/// POST /api/internal/content/{type}/rebuild - Re-derive the cached entry
/// from the latest stored version.
pub async fn rebuild_content(
    State(state): State<AppState>,
    Path(raw_type): Path<String>,
) -> ApiResult<CacheEntry> {
    let content_type = parse_content_type(&raw_type)?;

    let repo = state.store.repository().await?;
    let latest = repo
        .latest_content_version(content_type)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No stored versions for {}", content_type)))?;

    let entry = CacheEntry::from(latest);
    cache::store_entry(state.cache.as_ref(), content_type.key(), &entry).await?;
    tracing::info!(content_type = %content_type, version = entry.version, "Cache rebuilt");

    success(entry)
}

/// GET /api/internal/content/{type}/history - Stored versions, newest first.
pub async fn content_history(
    State(state): State<AppState>,
    Path(raw_type): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<ContentVersion>> {
    let content_type = parse_content_type(&raw_type)?;

    let repo = state.store.repository().await?;
    let versions = repo
        .list_content_versions(content_type, query.limit())
        .await?;

    success(versions)
}

/// GET /api/internal/contact - Most recent contact messages.
pub async fn list_contact_messages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<ContactMessageList> {
    let repo = state.store.repository().await?;
    let total = repo.count_contact_messages().await?;
    let messages = repo.list_contact_messages(query.limit()).await?;

    success(ContactMessageList { total, messages })
}
