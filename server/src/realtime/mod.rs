//! Real-time event bus (§4.6): in-process fan-out per user, bounded
//! per-client buffers, drop-on-overflow, strictly increasing global sequence.
pub mod sse;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};

const CHANNEL_BUFFER: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: chrono::DateTime<Utc>,
    pub seq: u64,
}

struct Channel {
    id: u64,
    sender: mpsc::Sender<RealtimeEvent>,
}

pub struct RealtimeBus {
    channels: RwLock<HashMap<i32, Vec<Channel>>>,
    sequence: AtomicU64,
    next_channel_id: AtomicU64,
    dropped: AtomicU64,
}

impl Default for RealtimeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeBus {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            next_channel_id: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub async fn subscribe(&self, user_id: i32) -> (u64, mpsc::Receiver<RealtimeEvent>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER);
        let channel_id = self.next_channel_id.fetch_add(1, Ordering::SeqCst);
        self.channels.write().await.entry(user_id).or_default().push(Channel { id: channel_id, sender });
        (channel_id, receiver)
    }

    pub async fn unsubscribe(&self, user_id: i32, channel_id: u64) {
        let mut channels = self.channels.write().await;
        if let Some(list) = channels.get_mut(&user_id) {
            list.retain(|c| c.id != channel_id);
            if list.is_empty() {
                channels.remove(&user_id);
            }
        }
    }

    /// Assigns `event.seq` before copying the channel set so sequence numbers
    /// reflect push order across all users; the read lock is released before
    /// sending so a slow subscriber never blocks a publisher under lock.
    pub async fn push(&self, user_id: i32, event_type: &str, data: serde_json::Value) {
        let event = self.stamp(event_type, data);
        let senders: Vec<mpsc::Sender<RealtimeEvent>> = {
            let channels = self.channels.read().await;
            channels.get(&user_id).map(|list| list.iter().map(|c| c.sender.clone()).collect()).unwrap_or_default()
        };
        for sender in senders {
            if sender.try_send(event.clone()).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub async fn broadcast(&self, event_type: &str, data: serde_json::Value) {
        let event = self.stamp(event_type, data);
        let senders: Vec<mpsc::Sender<RealtimeEvent>> = {
            let channels = self.channels.read().await;
            channels.values().flatten().map(|c| c.sender.clone()).collect()
        };
        for sender in senders {
            if sender.try_send(event.clone()).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn stamp(&self, event_type: &str, data: serde_json::Value) -> RealtimeEvent {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        RealtimeEvent { event_type: event_type.to_string(), data, timestamp: Utc::now(), seq }
    }
}

pub type SharedRealtimeBus = Arc<RealtimeBus>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_delivers_to_subscribed_channel_only() {
        let bus = RealtimeBus::new();
        let (_id, mut rx) = bus.subscribe(1).await;
        let (_other_id, mut other_rx) = bus.subscribe(2).await;

        bus.push(1, "new_mail", serde_json::json!({"email_id": 7})).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, "new_mail");
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn sequence_is_strictly_increasing_across_users() {
        let bus = RealtimeBus::new();
        let (_id_a, mut rx_a) = bus.subscribe(1).await;
        let (_id_b, mut rx_b) = bus.subscribe(2).await;

        bus.push(1, "a", serde_json::Value::Null).await;
        bus.push(2, "b", serde_json::Value::Null).await;

        let first = rx_a.recv().await.unwrap();
        let second = rx_b.recv().await.unwrap();
        assert!(second.seq > first.seq);
    }

    #[tokio::test]
    async fn unsubscribe_removes_only_that_channel() {
        let bus = RealtimeBus::new();
        let (id_a, mut rx_a) = bus.subscribe(1).await;
        let (_id_b, mut rx_b) = bus.subscribe(1).await;

        bus.unsubscribe(1, id_a).await;
        bus.push(1, "x", serde_json::Value::Null).await;

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn overflow_drops_silently_and_increments_counter() {
        let bus = RealtimeBus::new();
        let (_id, _rx) = bus.subscribe(1).await;

        for _ in 0..CHANNEL_BUFFER + 5 {
            bus.push(1, "x", serde_json::Value::Null).await;
        }

        assert!(bus.dropped_count() > 0);
    }
}
