//! Aggregations over the whole store: topic overview, tag statistics and
//! the per-topic projection handed to the model for summarizing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::item::Timestamp;
use super::store::Topics;

/// Number of tags reported by `statistics`
pub const TOP_TAGS_LIMIT: usize = 10;

/// One line of the topic listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicOverview {
    pub topic: String,
    pub count: usize,
    /// Sorted union of the raw tag strings in the topic
    pub tags: Vec<String>,
    pub latest_activity: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStatistics {
    pub total_memories: usize,
    pub total_topics: usize,
    pub top_tags: Vec<TagCount>,
}

/// Projection of a single item for summarizing; `updated_at` is left out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestEntry {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDigest {
    pub topic: String,
    pub total_entries: usize,
    pub entries: Vec<DigestEntry>,
}

/// Summaries of every topic, most recently active first.
///
/// Topics without any timestamp sort last. Ties keep store order.
pub fn topic_overviews(topics: &Topics) -> Vec<TopicOverview> {
    let mut overviews: Vec<TopicOverview> = topics
        .iter()
        .map(|(topic, items)| {
            let tags: BTreeSet<&str> = items
                .iter()
                .flat_map(|item| item.tags.iter().map(String::as_str))
                .collect();

            TopicOverview {
                topic: topic.clone(),
                count: items.len(),
                tags: tags.into_iter().map(String::from).collect(),
                latest_activity: items.iter().map(|item| item.last_activity()).max().cloned(),
            }
        })
        .collect();

    // None < Some(_), so a descending sort leaves timestamp-less topics at the end
    overviews.sort_by(|a, b| b.latest_activity.cmp(&a.latest_activity));
    overviews
}

/// Store-wide totals and the most frequent tags.
///
/// Tags are counted by exact string. Equal counts keep first-seen order.
pub fn statistics(topics: &Topics) -> MemoryStatistics {
    let mut counter: IndexMap<&str, usize> = IndexMap::new();
    for item in topics.values().flatten() {
        for tag in &item.tags {
            *counter.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counter.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    MemoryStatistics {
        total_memories: topics.values().map(Vec::len).sum(),
        total_topics: topics.len(),
        top_tags: ranked
            .into_iter()
            .take(TOP_TAGS_LIMIT)
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect(),
    }
}

/// Projection of one topic, or `None` when the topic is absent
pub fn digest(topics: &Topics, topic: &str) -> Option<TopicDigest> {
    let items = topics.get(topic)?;
    Some(TopicDigest {
        topic: topic.to_string(),
        total_entries: items.len(),
        entries: items
            .iter()
            .map(|item| DigestEntry {
                title: item.title.clone(),
                content: item.content.clone(),
                tags: item.tags.clone(),
                created_at: item.created_at.clone(),
            })
            .collect(),
    })
}
