//! Redis Streams implementation of `StreamBackend`, grounded on `sideseat`'s
//! `data/topics/redis.rs`: `XADD`/`XGROUP CREATE`/`XREADGROUP`/`XACK`/
//! `XCLAIM`/`XPENDING`/`XRANGE` over a `deadpool_redis` pool.
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use deadpool_redis::{
    redis::{self, cmd, AsyncCommands},
    Config, Pool, Runtime,
};

use crate::error::AppError;

use super::backend::{PendingEntry, StreamBackend, StreamEntry, StreamStats};

pub struct RedisStreamBackend {
    pool: Pool,
}

impl RedisStreamBackend {
    pub fn new(redis_url: &str) -> Result<Self, AppError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| AppError::Stream(format!("failed to create redis pool: {e}")))?;
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, AppError> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::Stream(format!("redis pool exhausted: {e}")))
    }
}

#[async_trait]
impl StreamBackend for RedisStreamBackend {
    async fn ensure_group(&self, topic: &str, group: &str) -> Result<(), AppError> {
        let mut conn = self.conn().await?;
        let result: redis::RedisResult<String> = cmd("XGROUP")
            .arg("CREATE")
            .arg(topic)
            .arg(group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(AppError::Stream(format!("XGROUP CREATE failed: {e}"))),
        }
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<String, AppError> {
        let mut conn = self.conn().await?;
        let id: String = conn
            .xadd(topic, "*", &[("data", payload)])
            .await
            .map_err(|e| AppError::Stream(format!("XADD failed: {e}")))?;
        Ok(id)
    }

    async fn read_group(
        &self,
        topics: &[&str],
        group: &str,
        consumer: &str,
        count: usize,
        block: Duration,
    ) -> Result<Vec<(String, StreamEntry)>, AppError> {
        let mut conn = self.conn().await?;
        let ids = vec![">"; topics.len()];

        let mut c = cmd("XREADGROUP");
        c.arg("GROUP").arg(group).arg(consumer);
        c.arg("COUNT").arg(count);
        c.arg("BLOCK").arg(block.as_millis() as i64);
        c.arg("STREAMS");
        for t in topics {
            c.arg(*t);
        }
        for id in ids {
            c.arg(id);
        }

        let reply: redis::Value = c
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Stream(format!("XREADGROUP failed: {e}")))?;

        Ok(parse_xreadgroup(reply))
    }

    async fn ack(&self, topic: &str, group: &str, id: &str) -> Result<(), AppError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn
            .xack(topic, group, &[id])
            .await
            .map_err(|e| AppError::Stream(format!("XACK failed: {e}")))?;
        Ok(())
    }

    async fn read_by_id(&self, topic: &str, id: &str) -> Result<Option<StreamEntry>, AppError> {
        let mut conn = self.conn().await?;
        let reply: redis::Value = cmd("XRANGE")
            .arg(topic)
            .arg(id)
            .arg(id)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Stream(format!("XRANGE failed: {e}")))?;

        Ok(parse_xrange_one(reply))
    }

    async fn pending(&self, topic: &str, group: &str) -> Result<Vec<PendingEntry>, AppError> {
        let mut conn = self.conn().await?;
        let reply: redis::Value = cmd("XPENDING")
            .arg(topic)
            .arg(group)
            .arg("-")
            .arg("+")
            .arg(1000)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Stream(format!("XPENDING failed: {e}")))?;

        Ok(parse_xpending_detail(reply))
    }

    async fn claim(
        &self,
        topic: &str,
        group: &str,
        consumer: &str,
        id: &str,
        min_idle: Duration,
    ) -> Result<Option<StreamEntry>, AppError> {
        let mut conn = self.conn().await?;
        let reply: redis::Value = cmd("XCLAIM")
            .arg(topic)
            .arg(group)
            .arg(consumer)
            .arg(min_idle.as_millis() as i64)
            .arg(id)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Stream(format!("XCLAIM failed: {e}")))?;

        Ok(parse_xrange_one(reply))
    }

    async fn stats(&self, topic: &str, group: &str) -> Result<StreamStats, AppError> {
        let mut conn = self.conn().await?;
        let length: u64 = conn
            .xlen(topic)
            .await
            .map_err(|e| AppError::Stream(format!("XLEN failed: {e}")))?;

        let summary: redis::Value = cmd("XPENDING")
            .arg(topic)
            .arg(group)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Stream(format!("XPENDING summary failed: {e}")))?;

        let (pending, consumers) = parse_xpending_summary(summary);
        Ok(StreamStats { length, pending, consumers })
    }
}

fn extract_fields(fields: redis::Value) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let redis::Value::Bulk(items) = fields {
        let mut iter = items.into_iter();
        while let (Some(redis::Value::Data(k)), Some(v)) = (iter.next(), iter.next()) {
            let key = String::from_utf8_lossy(&k).to_string();
            let val = match v {
                redis::Value::Data(d) => String::from_utf8_lossy(&d).to_string(),
                other => format!("{other:?}"),
            };
            map.insert(key, val);
        }
    }
    map
}

fn parse_xreadgroup(reply: redis::Value) -> Vec<(String, StreamEntry)> {
    let mut out = Vec::new();
    let redis::Value::Bulk(streams) = reply else { return out };

    for stream in streams {
        let redis::Value::Bulk(stream_pair) = stream else { continue };
        let mut iter = stream_pair.into_iter();
        let (Some(redis::Value::Data(topic_bytes)), Some(redis::Value::Bulk(entries))) =
            (iter.next(), iter.next())
        else {
            continue;
        };
        let topic = String::from_utf8_lossy(&topic_bytes).to_string();

        for entry in entries {
            let redis::Value::Bulk(entry_pair) = entry else { continue };
            let mut e_iter = entry_pair.into_iter();
            let (Some(redis::Value::Data(id_bytes)), Some(fields)) = (e_iter.next(), e_iter.next())
            else {
                continue;
            };
            let id = String::from_utf8_lossy(&id_bytes).to_string();
            out.push((topic.clone(), StreamEntry { id, fields: extract_fields(fields) }));
        }
    }

    out
}

fn parse_xrange_one(reply: redis::Value) -> Option<StreamEntry> {
    let redis::Value::Bulk(entries) = reply else { return None };
    let entry = entries.into_iter().next()?;
    let redis::Value::Bulk(entry_pair) = entry else { return None };
    let mut iter = entry_pair.into_iter();
    let id_val = iter.next()?;
    let fields = iter.next()?;
    let redis::Value::Data(id_bytes) = id_val else { return None };
    Some(StreamEntry {
        id: String::from_utf8_lossy(&id_bytes).to_string(),
        fields: extract_fields(fields),
    })
}

fn parse_xpending_detail(reply: redis::Value) -> Vec<PendingEntry> {
    let mut out = Vec::new();
    let redis::Value::Bulk(rows) = reply else { return out };

    for row in rows {
        let redis::Value::Bulk(cols) = row else { continue };
        if cols.len() < 4 {
            continue;
        }
        let id = match &cols[0] {
            redis::Value::Data(d) => String::from_utf8_lossy(d).to_string(),
            _ => continue,
        };
        let consumer = match &cols[1] {
            redis::Value::Data(d) => String::from_utf8_lossy(d).to_string(),
            _ => continue,
        };
        let idle_ms: i64 = match &cols[2] {
            redis::Value::Int(n) => *n,
            _ => 0,
        };
        let delivery_count: u64 = match &cols[3] {
            redis::Value::Int(n) => *n as u64,
            _ => 0,
        };
        out.push(PendingEntry {
            id,
            consumer,
            delivery_count,
            idle: Duration::from_millis(idle_ms.max(0) as u64),
        });
    }

    out
}

fn parse_xpending_summary(reply: redis::Value) -> (u64, u64) {
    let redis::Value::Bulk(cols) = reply else { return (0, 0) };
    let pending = match cols.first() {
        Some(redis::Value::Int(n)) => *n as u64,
        _ => 0,
    };
    let consumers = match cols.get(3) {
        Some(redis::Value::Bulk(items)) => items.len() as u64,
        _ => 0,
    };
    (pending, consumers)
}
