//! Memory items and timestamps

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width rendering used for every stored timestamp
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// UTC timestamp with second precision, stored as `YYYY-MM-DDTHH:MM:SS`.
///
/// Every value has the same width and field order, so comparing the strings
/// compares the instants. `Ord` relies on that, and construction from a
/// string rejects anything that does not have exactly this shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(String);

impl Timestamp {
    /// Current UTC time, truncated to seconds
    pub fn now() -> Self {
        Self(Utc::now().format(TIMESTAMP_FORMAT).to_string())
    }

    /// Parse and validate a stored timestamp
    pub fn parse(value: &str) -> Result<Self, String> {
        let parsed = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .map_err(|e| format!("invalid timestamp '{}': {}", value, e))?;

        // Re-render to reject forms chrono accepts loosely (e.g. missing zero padding)
        let canonical = parsed.format(TIMESTAMP_FORMAT).to_string();
        if canonical != value {
            return Err(format!(
                "invalid timestamp '{}': expected {}",
                value, TIMESTAMP_FORMAT
            ));
        }

        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Timestamp {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One remembered fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub topic: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

impl MemoryItem {
    /// Create a new item stamped with the current time
    pub fn create(
        topic: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Option<Vec<String>>,
    ) -> Self {
        Self {
            topic: topic.into(),
            title: title.into(),
            content: content.into(),
            tags: tags.unwrap_or_default(),
            created_at: Timestamp::now(),
            updated_at: None,
        }
    }

    /// Case-insensitive title comparison used by read, update and delete
    pub fn title_matches(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }

    /// Most recent activity: the update time, falling back to creation
    pub fn last_activity(&self) -> &Timestamp {
        self.updated_at.as_ref().unwrap_or(&self.created_at)
    }

    /// Lowercased topic, title, content and tags joined by spaces
    pub(crate) fn haystack(&self) -> String {
        [
            self.topic.as_str(),
            self.title.as_str(),
            self.content.as_str(),
            &self.tags.join(" "),
        ]
        .join(" ")
        .to_lowercase()
    }
}
