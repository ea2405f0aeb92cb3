//! Published content: content types, stored versions and cache entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of content the site publishes. Each kind has one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Projects,
    About,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Projects, ContentType::About];

    /// Key used both as the cache key and the store discriminator.
    pub fn key(self) -> &'static str {
        match self {
            ContentType::Projects => "projects",
            ContentType::About => "about",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projects" => Ok(ContentType::Projects),
            "about" => Ok(ContentType::About),
            other => Err(format!("Unknown content type '{}'", other)),
        }
    }
}

/// One append-only snapshot of a content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVersion {
    pub version: i64,
    pub created_at: String,
    pub data: Value,
}

/// Value held in the read cache and served verbatim to browsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub version: i64,
    pub data: Value,
}

impl From<ContentVersion> for CacheEntry {
    fn from(stored: ContentVersion) -> Self {
        Self {
            version: stored.version,
            data: stored.data,
        }
    }
}

/// Request body for publishing a new version of a content type.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishContentRequest {
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_type_parse() {
        assert_eq!("projects".parse::<ContentType>(), Ok(ContentType::Projects));
        assert_eq!("about".parse::<ContentType>(), Ok(ContentType::About));
        assert!("Projects".parse::<ContentType>().is_err());
        assert!("blog".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_cache_entry_wire_format() {
        let entry = CacheEntry {
            version: 5,
            data: json!({ "foo": 1 }),
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"version":5,"data":{"foo":1}}"#
        );
    }

    #[test]
    fn test_publish_request_requires_data() {
        assert!(serde_json::from_str::<PublishContentRequest>(r#"{"items":[]}"#).is_err());
        let request: PublishContentRequest =
            serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(request.data.is_null());
    }
}
