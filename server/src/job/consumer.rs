//! Job consumer (§4.1): one process per worker, joining named groups over N
//! topics, dispatching to typed handlers, and running a periodic reaper for
//! stuck in-flight entries. Grounded on the teacher's
//! `ActiveEmailProcessorMap`/`watch()` loop shape (`email/active_email_processors.rs`)
//! — a long-lived `tokio::spawn`ed loop plus a sibling interval-driven task —
//! generalized from a single-queue poller to a multi-topic stream consumer.
use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::watch;

use crate::{config::cfg, error::AppError, stream::StreamBackend};

use super::{dlq::escalate_to_dlq, handler::JobHandler};

pub struct JobConsumer {
    backend: Arc<dyn StreamBackend>,
    group: String,
    consumer_name: String,
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobConsumer {
    pub fn new(backend: Arc<dyn StreamBackend>, consumer_name: impl Into<String>) -> Self {
        Self {
            backend,
            group: cfg.stream.consumer_group.clone(),
            consumer_name: consumer_name.into(),
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, topic: &str, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(topic.to_string(), handler);
    }

    pub async fn ensure_groups(&self) -> Result<(), AppError> {
        for topic in self.handlers.keys() {
            self.backend.ensure_group(topic, &self.group).await?;
        }
        Ok(())
    }

    /// Runs the block-read loop until `shutdown` fires. Spawns the reaper as
    /// a sibling task sharing the same cancellation signal.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let reaper_shutdown = shutdown.clone();
        let reaper_self = self.clone();
        tokio::spawn(async move { reaper_self.run_reaper(reaper_shutdown).await });

        let topics: Vec<&str> = self.handlers.keys().map(String::as_str).collect();

        loop {
            if *shutdown.borrow() {
                break;
            }

            let batch = tokio::select! {
                res = self.backend.read_group(
                    &topics,
                    &self.group,
                    &self.consumer_name,
                    cfg.stream.batch_size,
                    cfg.block_wait(),
                ) => res,
                _ = shutdown.changed() => break,
            };

            let entries = match batch {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!("stream read failed: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            for (topic, entry) in entries {
                let Some(handler) = self.handlers.get(&topic).cloned() else {
                    tracing::warn!(topic, "no handler registered, leaving pending");
                    continue;
                };
                let Some(data) = entry.data() else {
                    tracing::warn!(topic, id = %entry.id, "entry missing `data` field");
                    continue;
                };

                match handler.handle(data).await {
                    Ok(()) => {
                        if let Err(e) = self.backend.ack(&topic, &self.group, &entry.id).await {
                            tracing::error!("ack failed for {topic}/{}: {e}", entry.id);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(topic, id = %entry.id, "handler failed, leaving pending for reaper: {e}");
                    }
                }
            }
        }
    }

    async fn run_reaper(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(cfg.reap_interval());
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }
            for (topic, handler) in &self.handlers {
                if let Err(e) = self.reap_topic(topic, handler).await {
                    tracing::error!("reaper failed for {topic}: {e}");
                }
            }
        }
    }

    async fn reap_topic(&self, topic: &str, handler: &Arc<dyn JobHandler>) -> Result<(), AppError> {
        let pending = self.backend.pending(topic, &self.group).await?;
        let idle_threshold = cfg.idle_threshold();

        for p in pending {
            if p.idle < idle_threshold {
                continue;
            }

            if p.delivery_count >= cfg.stream.max_retries as u64 {
                if let Some(entry) = self.backend.read_by_id(topic, &p.id).await? {
                    escalate_to_dlq(self.backend.as_ref(), topic, &self.group, &p.consumer, &entry).await?;
                }
                self.backend.ack(topic, &self.group, &p.id).await?;
                continue;
            }

            let claimed = self
                .backend
                .claim(topic, &self.group, &self.consumer_name, &p.id, idle_threshold)
                .await?;

            if let Some(entry) = claimed {
                let Some(data) = entry.data() else { continue };
                match handler.handle(data).await {
                    Ok(()) => {
                        self.backend.ack(topic, &self.group, &p.id).await?;
                    }
                    Err(e) => {
                        tracing::warn!(topic, id = %p.id, "reclaimed handler failed again: {e}");
                    }
                }
            }
        }

        Ok(())
    }
}
