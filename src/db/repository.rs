//! Database repository for content versions and contact messages.
//!
//! Content versions are append-only; nothing here updates or deletes a row.

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{ContactMessage, ContentType, ContentVersion, NewContactMessage};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== CONTENT OPERATIONS ====================

    /// Append a new version of `content_type` and return it.
    ///
    /// The version is the current time in milliseconds, bumped past the latest
    /// stored version when needed, so versions of one content type strictly increase.
    pub async fn append_content_version(
        &self,
        content_type: ContentType,
        data: &serde_json::Value,
    ) -> Result<ContentVersion, AppError> {
        let now = Utc::now();
        let payload = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("Failed to encode payload: {}", e)))?;

        // Single statement so concurrent writers cannot pick the same version
        let row = sqlx::query(
            r#"
            INSERT INTO content_versions (content_type, version, payload, created_at)
            SELECT ?, MAX(?, COALESCE(MAX(version), 0) + 1), ?, ?
            FROM content_versions WHERE content_type = ?
            RETURNING version
            "#,
        )
        .bind(content_type.key())
        .bind(now.timestamp_millis())
        .bind(&payload)
        .bind(now.to_rfc3339())
        .bind(content_type.key())
        .fetch_one(&self.pool)
        .await?;

        Ok(ContentVersion {
            version: row.get("version"),
            created_at: now.to_rfc3339(),
            data: data.clone(),
        })
    }

    /// Get the most recent version of `content_type`, if any was ever stored.
    pub async fn latest_content_version(
        &self,
        content_type: ContentType,
    ) -> Result<Option<ContentVersion>, AppError> {
        let row = sqlx::query(
            "SELECT version, payload, created_at FROM content_versions WHERE content_type = ? ORDER BY version DESC LIMIT 1",
        )
        .bind(content_type.key())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(content_version_from_row).transpose()
    }

    /// List stored versions of `content_type`, newest first.
    pub async fn list_content_versions(
        &self,
        content_type: ContentType,
        limit: i64,
    ) -> Result<Vec<ContentVersion>, AppError> {
        let rows = sqlx::query(
            "SELECT version, payload, created_at FROM content_versions WHERE content_type = ? ORDER BY version DESC LIMIT ?",
        )
        .bind(content_type.key())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(content_version_from_row).collect()
    }

    // ==================== CONTACT OPERATIONS ====================

    /// Persist a contact message.
    pub async fn create_contact_message(
        &self,
        message: &NewContactMessage,
    ) -> Result<ContactMessage, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO contact_messages (id, name, email, message, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.message)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(ContactMessage {
            id,
            name: message.name.clone(),
            email: message.email.clone(),
            message: message.message.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List contact messages, newest first.
    pub async fn list_contact_messages(&self, limit: i64) -> Result<Vec<ContactMessage>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, email, message, created_at, updated_at FROM contact_messages ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(contact_message_from_row).collect())
    }

    /// Count stored contact messages.
    pub async fn count_contact_messages(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM contact_messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }
}

// ==================== ROW MAPPERS ====================

fn content_version_from_row(row: &SqliteRow) -> Result<ContentVersion, AppError> {
    let payload: String = row.get("payload");
    let data = serde_json::from_str(&payload)
        .map_err(|e| AppError::Database(format!("Corrupt stored payload: {}", e)))?;

    Ok(ContentVersion {
        version: row.get("version"),
        created_at: row.get("created_at"),
        data,
    })
}

fn contact_message_from_row(row: &SqliteRow) -> ContactMessage {
    ContactMessage {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        message: row.get("message"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use serde_json::json;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}", temp_dir.path().join("repo.sqlite").display());
        let pool = init_database(&url).await.unwrap();
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_versions_strictly_increase() {
        let (repo, _dir) = repo().await;

        let mut previous = 0;
        for i in 0..5 {
            let stored = repo
                .append_content_version(ContentType::Projects, &json!({ "n": i }))
                .await
                .unwrap();
            assert!(stored.version > previous);
            previous = stored.version;
        }

        let latest = repo
            .latest_content_version(ContentType::Projects)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, previous);
        assert_eq!(latest.data, json!({ "n": 4 }));
    }

    #[tokio::test]
    async fn test_content_types_are_independent() {
        let (repo, _dir) = repo().await;

        repo.append_content_version(ContentType::About, &json!({ "bio": "hi" }))
            .await
            .unwrap();

        assert!(repo
            .latest_content_version(ContentType::Projects)
            .await
            .unwrap()
            .is_none());

        let history = repo
            .list_content_versions(ContentType::About, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].data["bio"], "hi");
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_limited() {
        let (repo, _dir) = repo().await;

        for i in 0..4 {
            repo.append_content_version(ContentType::Projects, &json!([i]))
                .await
                .unwrap();
        }

        let history = repo
            .list_content_versions(ContentType::Projects, 2)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].data, json!([3]));
        assert_eq!(history[1].data, json!([2]));
        assert!(history[0].version > history[1].version);
    }

    #[tokio::test]
    async fn test_contact_messages() {
        let (repo, _dir) = repo().await;

        let created = repo
            .create_contact_message(&NewContactMessage {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                message: "Hello".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(repo.count_contact_messages().await.unwrap(), 1);
        let listed = repo.list_contact_messages(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].created_at, listed[0].updated_at);
    }
}
