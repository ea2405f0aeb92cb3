//! Contact form messages.

use serde::{Deserialize, Serialize};

/// A stored visitor message. Created once, never updated by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw contact form body. Fields are optional so that missing ones surface
/// as validation errors rather than parse errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Older form variant; used when `message` is absent or blank.
    #[serde(default)]
    pub interest: Option<String>,
}

/// A contact submission with every required field present.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactRequest {
    /// Check required fields, returning the names of those that are missing or blank.
    pub fn validate(self) -> Result<NewContactMessage, Vec<&'static str>> {
        fn present(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let name = present(self.name);
        let email = present(self.email);
        let message = present(self.message).or_else(|| present(self.interest));

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) => Ok(NewContactMessage {
                name,
                email,
                message,
            }),
            (name, email, message) => {
                let mut missing = Vec::new();
                if name.is_none() {
                    missing.push("name");
                }
                if email.is_none() {
                    missing.push("email");
                }
                if message.is_none() {
                    missing.push("message");
                }
                Err(missing)
            }
        }
    }
}
