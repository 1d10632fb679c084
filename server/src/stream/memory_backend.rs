//! In-memory `StreamBackend` for tests, mirroring Redis Streams semantics
//! closely enough to exercise the consumer/reaper loop without a broker.
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::AppError;

use super::backend::{PendingEntry, StreamBackend, StreamEntry, StreamStats};

struct Pending {
    entry: StreamEntry,
    consumer: String,
    delivery_count: u64,
    delivered_at: Instant,
}

#[derive(Default)]
struct Topic {
    log: Vec<StreamEntry>,
    groups: HashMap<String, HashMap<String, Pending>>,
    cursor: HashMap<String, usize>,
}

#[derive(Default)]
pub struct InMemoryStreamBackend {
    topics: Mutex<HashMap<String, Topic>>,
    seq: AtomicU64,
}

impl InMemoryStreamBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StreamBackend for InMemoryStreamBackend {
    async fn ensure_group(&self, topic: &str, group: &str) -> Result<(), AppError> {
        let mut topics = self.topics.lock();
        let t = topics.entry(topic.to_string()).or_default();
        t.groups.entry(group.to_string()).or_default();
        t.cursor.entry(group.to_string()).or_insert(0);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<String, AppError> {
        let id = format!("{}-0", self.seq.fetch_add(1, Ordering::SeqCst));
        let mut fields = HashMap::new();
        fields.insert("data".to_string(), payload.to_string());
        let mut topics = self.topics.lock();
        let t = topics.entry(topic.to_string()).or_default();
        t.log.push(StreamEntry { id: id.clone(), fields });
        Ok(id)
    }

    async fn read_group(
        &self,
        topics: &[&str],
        group: &str,
        consumer: &str,
        count: usize,
        _block: Duration,
    ) -> Result<Vec<(String, StreamEntry)>, AppError> {
        let mut out = Vec::new();
        let mut guard = self.topics.lock();
        for &topic in topics {
            let t = guard.entry(topic.to_string()).or_default();
            let cursor = *t.cursor.entry(group.to_string()).or_insert(0);
            let available = t.log.len().saturating_sub(cursor);
            let take = available.min(count - out.len());
            if take == 0 {
                continue;
            }
            let entries: Vec<StreamEntry> = t.log[cursor..cursor + take].to_vec();
            *t.cursor.get_mut(group).unwrap() += take;
            let pending = t.groups.entry(group.to_string()).or_default();
            for e in entries {
                pending.insert(
                    e.id.clone(),
                    Pending { entry: e.clone(), consumer: consumer.to_string(), delivery_count: 1, delivered_at: Instant::now() },
                );
                out.push((topic.to_string(), e));
            }
            if out.len() >= count {
                break;
            }
        }
        Ok(out)
    }

    async fn ack(&self, topic: &str, group: &str, id: &str) -> Result<(), AppError> {
        let mut topics = self.topics.lock();
        if let Some(t) = topics.get_mut(topic) {
            if let Some(g) = t.groups.get_mut(group) {
                g.remove(id);
            }
        }
        Ok(())
    }

    async fn read_by_id(&self, topic: &str, id: &str) -> Result<Option<StreamEntry>, AppError> {
        let topics = self.topics.lock();
        Ok(topics.get(topic).and_then(|t| t.log.iter().find(|e| e.id == id).cloned()))
    }

    async fn pending(&self, topic: &str, group: &str) -> Result<Vec<PendingEntry>, AppError> {
        let topics = self.topics.lock();
        let Some(t) = topics.get(topic) else { return Ok(vec![]) };
        let Some(g) = t.groups.get(group) else { return Ok(vec![]) };
        Ok(g.values()
            .map(|p| PendingEntry {
                id: p.entry.id.clone(),
                consumer: p.consumer.clone(),
                delivery_count: p.delivery_count,
                idle: p.delivered_at.elapsed(),
            })
            .collect())
    }

    async fn claim(
        &self,
        topic: &str,
        group: &str,
        consumer: &str,
        id: &str,
        min_idle: Duration,
    ) -> Result<Option<StreamEntry>, AppError> {
        let mut topics = self.topics.lock();
        let Some(t) = topics.get_mut(topic) else { return Ok(None) };
        let Some(g) = t.groups.get_mut(group) else { return Ok(None) };
        let Some(p) = g.get_mut(id) else { return Ok(None) };
        if p.delivered_at.elapsed() < min_idle {
            return Ok(None);
        }
        p.consumer = consumer.to_string();
        p.delivery_count += 1;
        p.delivered_at = Instant::now();
        Ok(Some(p.entry.clone()))
    }

    async fn stats(&self, topic: &str, group: &str) -> Result<StreamStats, AppError> {
        let topics = self.topics.lock();
        let Some(t) = topics.get(topic) else { return Ok(StreamStats::default()) };
        let pending = t.groups.get(group).map(|g| g.len() as u64).unwrap_or(0);
        Ok(StreamStats { length: t.log.len() as u64, pending, consumers: 1 })
    }
}
