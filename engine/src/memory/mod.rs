//! Persistent Memory Store
//!
//! Remembered facts are grouped by topic and kept in a single JSON file.
//! The store offers append-only writes, filtered reads, first-match updates,
//! title or whole-topic deletes, and three aggregations (topic listing, tag
//! statistics and a per-topic projection for summarizing).

pub mod aggregate;
pub mod item;
pub mod store;

pub use aggregate::{DigestEntry, MemoryStatistics, TagCount, TopicDigest, TopicOverview};
pub use item::{MemoryItem, Timestamp};
pub use store::{MemoryStore, ReadFilter, ReadResult, Topics};
