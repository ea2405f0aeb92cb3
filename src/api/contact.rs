//! Contact form endpoint.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::ContactRequest;
use crate::rate_limit::client_key;
use crate::AppState;

/// Acknowledgement returned for an accepted message.
#[derive(Debug, Serialize)]
pub struct ContactAck {
    pub ok: bool,
}

/// POST /api/contact - Store a visitor message.
///
/// The rate limit is checked before the body is even parsed, so rejected
/// requests never reach the content store.
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ContactAck>, AppError> {
    let client = client_key(&headers);
    if let Err(retry_after_secs) = state.contact_limiter.check(&client) {
        tracing::warn!(client = %client, retry_after_secs, "Contact submission rate limited");
        return Err(AppError::RateLimited { retry_after_secs });
    }

    let request: ContactRequest = serde_json::from_slice(&body)?;

    let message = request.validate().map_err(|missing| {
        AppError::Validation(format!("Missing required fields: {}", missing.join(", ")))
    })?;

    let repo = state.store.repository().await?;
    let stored = repo.create_contact_message(&message).await?;
    tracing::info!(id = %stored.id, "Contact message stored");

    Ok(Json(ContactAck { ok: true }))
}
