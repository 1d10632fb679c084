//! Uniform stream contract (§4.1). Grounded on the `TopicBackend` stream
//! side from `sideseat`'s `data/topics/backend.rs`, narrowed to the
//! consumer-group semantics this system actually needs (no broadcast side;
//! that lives in `crate::realtime`, which is purely in-process per §4.6).
use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::AppError;

/// A single stream entry. `id` is assigned by the backend at publish time.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: String,
    pub fields: HashMap<String, String>,
}

impl StreamEntry {
    pub fn data(&self) -> Option<&str> {
        self.fields.get("data").map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub id: String,
    pub consumer: String,
    pub delivery_count: u64,
    pub idle: std::time::Duration,
}

#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub length: u64,
    pub pending: u64,
    pub consumers: u64,
}

/// `(topic, group, consumer_name)` stream-of-record contract. Implementations
/// must guarantee: at most one consumer holds a given pending entry at any
/// instant, and claim only succeeds once `idle >= min_idle`.
#[async_trait]
pub trait StreamBackend: Send + Sync {
    async fn ensure_group(&self, topic: &str, group: &str) -> Result<(), AppError>;

    async fn publish(&self, topic: &str, payload: &str) -> Result<String, AppError>;

    /// Block-read up to `count` entries across `topics` for `(group, consumer)`.
    async fn read_group(
        &self,
        topics: &[&str],
        group: &str,
        consumer: &str,
        count: usize,
        block: std::time::Duration,
    ) -> Result<Vec<(String, StreamEntry)>, AppError>;

    async fn ack(&self, topic: &str, group: &str, id: &str) -> Result<(), AppError>;

    /// Full entry-by-id fetch, used for DLQ copying.
    async fn read_by_id(&self, topic: &str, id: &str) -> Result<Option<StreamEntry>, AppError>;

    async fn pending(&self, topic: &str, group: &str) -> Result<Vec<PendingEntry>, AppError>;

    async fn claim(
        &self,
        topic: &str,
        group: &str,
        consumer: &str,
        id: &str,
        min_idle: std::time::Duration,
    ) -> Result<Option<StreamEntry>, AppError>;

    async fn stats(&self, topic: &str, group: &str) -> Result<StreamStats, AppError>;
}
