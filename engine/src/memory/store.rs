//! JSON-file backed memory store
//!
//! The store keeps no state between calls apart from the file path: every
//! operation reloads the whole file and every mutation rewrites it. There is
//! no locking and no atomic rename, so a second process writing the same file
//! can lose updates.

use indexmap::IndexMap;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::aggregate::{self, MemoryStatistics, TopicDigest, TopicOverview};
use super::item::{MemoryItem, Timestamp};

/// In-memory view of the store: topic -> items, both in insertion order
pub type Topics = IndexMap<String, Vec<MemoryItem>>;

/// On-disk shape of an item; the topic is the enclosing key
#[derive(Debug, Serialize, Deserialize)]
struct ItemRecord {
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    created_at: Timestamp,
    #[serde(default)]
    updated_at: Option<Timestamp>,
}

type StoreDocument = IndexMap<String, Vec<ItemRecord>>;

/// Filters accepted by `read`. All present filters must match.
///
/// Empty strings and an empty tag list count as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReadFilter {
    pub topic: Option<String>,
    pub title: Option<String>,
    pub query: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ReadFilter {
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    fn matches(&self, item: &MemoryItem) -> bool {
        if let Some(title) = non_empty(&self.title) {
            if !item.title_matches(title) {
                return false;
            }
        }

        if let Some(tags) = self.tags.as_ref().filter(|tags| !tags.is_empty()) {
            let wanted: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
            let hit = item
                .tags
                .iter()
                .any(|tag| wanted.contains(&tag.to_lowercase()));
            if !hit {
                return false;
            }
        }

        if let Some(query) = non_empty(&self.query) {
            if !item.haystack().contains(&query.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Result of `read`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadResult {
    pub count: usize,
    pub results: Vec<MemoryItem>,
}

/// Memory store bound to a single JSON file
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the backing file as an empty store if it does not exist yet
    pub fn ensure_exists(&self) -> Result<(), EngineError> {
        if self.path.exists() {
            return Ok(());
        }
        debug!("Creating empty memory store at {:?}", self.path);
        self.save(&Topics::new())
    }

    /// Append a new item, creating the topic when needed
    pub fn write(
        &self,
        topic: &str,
        title: &str,
        content: &str,
        tags: Option<Vec<String>>,
    ) -> Result<MemoryItem, EngineError> {
        let mut topics = self.load()?;
        let item = MemoryItem::create(topic, title, content, tags);
        topics
            .entry(topic.to_string())
            .or_default()
            .push(item.clone());
        self.save(&topics)?;

        debug!("Stored memory '{}' under topic '{}'", title, topic);
        Ok(item)
    }

    /// Items matching every present filter, in topic order then item order
    pub fn read(&self, filter: &ReadFilter) -> Result<ReadResult, EngineError> {
        let topics = self.load()?;

        let candidates: Vec<&Vec<MemoryItem>> = match non_empty(&filter.topic) {
            Some(topic) => topics.get(topic).into_iter().collect(),
            None => topics.values().collect(),
        };

        let results: Vec<MemoryItem> = candidates
            .into_iter()
            .flatten()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();

        debug!("Read {} memories with filter {:?}", results.len(), filter);
        Ok(ReadResult {
            count: results.len(),
            results,
        })
    }

    /// Update the first item in `topic` whose title matches.
    ///
    /// Content is replaced only by a non-empty value. Tags are replaced
    /// wholesale whenever given, so an empty list clears them. The update
    /// time is stamped either way.
    pub fn update(
        &self,
        topic: &str,
        title: &str,
        new_content: Option<&str>,
        new_tags: Option<Vec<String>>,
    ) -> Result<MemoryItem, EngineError> {
        let mut topics = self.load()?;

        let items = topics
            .get_mut(topic)
            .ok_or_else(|| EngineError::TopicMissing(topic.to_string()))?;

        let item = items
            .iter_mut()
            .find(|item| item.title_matches(title))
            .ok_or_else(|| EngineError::TitleMissing {
                topic: topic.to_string(),
                title: title.to_string(),
            })?;

        if let Some(content) = new_content.filter(|c| !c.is_empty()) {
            item.content = content.to_string();
        }
        if let Some(tags) = new_tags {
            item.tags = tags;
        }
        item.updated_at = Some(Timestamp::now());

        let updated = item.clone();
        self.save(&topics)?;

        debug!("Updated memory '{}' in topic '{}'", title, topic);
        Ok(updated)
    }

    /// Delete every item titled `title` in `topic`, or the whole topic when
    /// no title is given. Returns the number of items removed.
    pub fn delete(&self, topic: &str, title: Option<&str>) -> Result<usize, EngineError> {
        let mut topics = self.load()?;

        let items = topics
            .get_mut(topic)
            .ok_or_else(|| EngineError::TopicMissing(topic.to_string()))?;

        let deleted = match title.filter(|t| !t.is_empty()) {
            Some(title) => {
                let before = items.len();
                items.retain(|item| !item.title_matches(title));
                let deleted = before - items.len();

                if deleted == 0 {
                    return Err(EngineError::TitleMissing {
                        topic: topic.to_string(),
                        title: title.to_string(),
                    });
                }
                if items.is_empty() {
                    topics.shift_remove(topic);
                }
                deleted
            }
            None => topics.shift_remove(topic).map(|items| items.len()).unwrap_or(0),
        };

        self.save(&topics)?;

        debug!("Deleted {} memories from topic '{}'", deleted, topic);
        Ok(deleted)
    }

    /// Per-topic counts, tags and latest activity, most recent first
    pub fn list_topics(&self) -> Result<Vec<TopicOverview>, EngineError> {
        Ok(aggregate::topic_overviews(&self.load()?))
    }

    /// Totals and the ten most frequent tags
    pub fn get_statistics(&self) -> Result<MemoryStatistics, EngineError> {
        Ok(aggregate::statistics(&self.load()?))
    }

    /// Structured projection of one topic for an external summarizer
    pub fn summarize_topic(&self, topic: &str) -> Result<TopicDigest, EngineError> {
        aggregate::digest(&self.load()?, topic)
            .ok_or_else(|| EngineError::TopicMissing(topic.to_string()))
    }

    /// Load the whole store. A missing file is an empty store.
    fn load(&self) -> Result<Topics, EngineError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Topics::new()),
            Err(e) => {
                return Err(EngineError::StoreIo(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(Topics::new());
        }

        let document: StoreDocument = serde_json::from_str(&contents).map_err(|e| {
            EngineError::StoreCorrupt(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(document
            .into_iter()
            .map(|(topic, records)| {
                let items = records
                    .into_iter()
                    .map(|record| MemoryItem {
                        topic: topic.clone(),
                        title: record.title,
                        content: record.content,
                        tags: record.tags,
                        created_at: record.created_at,
                        updated_at: record.updated_at,
                    })
                    .collect();
                (topic, items)
            })
            .collect())
    }

    /// Rewrite the whole file
    fn save(&self, topics: &Topics) -> Result<(), EngineError> {
        let document: StoreDocument = topics
            .iter()
            .map(|(topic, items)| {
                let records = items
                    .iter()
                    .map(|item| ItemRecord {
                        title: item.title.clone(),
                        content: item.content.clone(),
                        tags: item.tags.clone(),
                        created_at: item.created_at.clone(),
                        updated_at: item.updated_at.clone(),
                    })
                    .collect();
                (topic.clone(), records)
            })
            .collect();

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| EngineError::StoreIo(format!("failed to encode store: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::StoreIo(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        fs::write(&self.path, json).map_err(|e| {
            EngineError::StoreIo(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}
