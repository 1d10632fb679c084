//! Three-tier body cache (§4.3), modeled on `sideseat-sideseat`'s
//! `data/cache/{mod,backend,memory}.rs`: a moka-backed hot tier, a
//! sea-orm-backed warm tier, and the provider adapter as tier 3. Lookups
//! that miss tier 1 enter a single-flight region so concurrent requesters
//! share one tier-2+tier-3 resolution.
pub mod list_cache;
pub mod prefetch;
pub mod single_flight;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use moka::future::Cache;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use entity::mail_body_cache;

use crate::{
    config::cfg,
    error::AppError,
    provider::{AttachmentDescriptor, MailProvider, MessageBody},
};

use single_flight::SingleFlight;

const GZIP_MAGIC: u8 = 0x1f;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum CachedBody {
    Sentinel,
    Body(MessageBody),
}

/// `(email_id, connection_id)`: the key both single-flight regions and the
/// hot tier are addressed by.
type BodyKey = (i32, i32);

pub struct CacheCore {
    hot: Cache<i32, Arc<Vec<u8>>>,
    db: DatabaseConnection,
    resolve_flight: SingleFlight<BodyKey, Result<MessageBody, CacheErrorTag>>,
    fetch_flight: SingleFlight<BodyKey, Result<MessageBody, CacheErrorTag>>,
}

/// `AppError` isn't `Clone`, so single-flight followers share this instead
/// and the leader rehydrates the real error message for its own caller.
#[derive(Debug, Clone)]
enum CacheErrorTag {
    Provider(String),
}

impl CacheCore {
    pub fn new(db: DatabaseConnection) -> Self {
        let hot = Cache::builder()
            .max_capacity(50_000)
            .time_to_live(Duration::from_secs(cfg.cache.hot_ttl_secs))
            .build();
        Self {
            hot,
            db,
            resolve_flight: SingleFlight::new(),
            fetch_flight: SingleFlight::new(),
        }
    }

    fn encode(body: &CachedBody) -> Vec<u8> {
        let raw = rmp_serde::to_vec(body).expect("CachedBody always serializes");
        if raw.len() >= cfg.cache.compression_threshold_bytes {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
            encoder.write_all(&raw).expect("in-memory gzip write cannot fail");
            let mut compressed = encoder.finish().expect("in-memory gzip finish cannot fail");
            compressed.insert(0, GZIP_MAGIC);
            compressed
        } else {
            let mut tagged = Vec::with_capacity(raw.len() + 1);
            tagged.push(0u8);
            tagged.extend_from_slice(&raw);
            tagged
        }
    }

    fn decode(bytes: &[u8]) -> Option<CachedBody> {
        let (tag, payload) = bytes.split_first()?;
        let raw = if *tag == GZIP_MAGIC {
            let mut decoder = GzDecoder::new(payload);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).ok()?;
            out
        } else {
            payload.to_vec()
        };
        rmp_serde::from_slice(&raw).ok()
    }

    async fn hot_get(&self, email_id: i32) -> Option<MessageBody> {
        let bytes = self.hot.get(&email_id).await?;
        match Self::decode(&bytes)? {
            CachedBody::Sentinel => Some(empty_body()),
            CachedBody::Body(body) => Some(body),
        }
    }

    async fn hot_set(&self, email_id: i32, cached: &CachedBody) {
        self.hot.insert(email_id, Arc::new(Self::encode(cached))).await;
    }

    async fn warm_get(&self, email_id: i32) -> Option<CachedBody> {
        let row = mail_body_cache::Entity::find_by_id(email_id).one(&self.db).await.ok().flatten()?;
        if row.expires_at < Utc::now() {
            return None;
        }
        if row.is_sentinel {
            return Some(CachedBody::Sentinel);
        }
        let attachments: Vec<AttachmentDescriptor> = serde_json::from_value(row.attachments).unwrap_or_default();
        Some(CachedBody::Body(MessageBody { text: row.text, html: row.html, attachments }))
    }

    /// Conditional on `received_at` being within the retention horizon;
    /// fired with `tokio::spawn` so the write-back stays off the read path.
    fn warm_set_async(&self, email_id: i32, received_at: DateTime<Utc>, cached: CachedBody) {
        let horizon = Utc::now() - chrono::Duration::days(cfg.cache.retention_horizon_days);
        if received_at < horizon {
            return;
        }
        let db = self.db.clone();
        tokio::spawn(async move {
            let (text, html, attachments, is_sentinel) = match cached {
                CachedBody::Sentinel => (String::new(), String::new(), serde_json::json!([]), true),
                CachedBody::Body(body) => {
                    let attachments = serde_json::to_value(&body.attachments).unwrap_or(serde_json::json!([]));
                    (body.text, body.html, attachments, false)
                }
            };
            let now = Utc::now();
            let expires_at = now + chrono::Duration::days(cfg.cache.warm_ttl_days as i64);
            let model = mail_body_cache::ActiveModel {
                email_id: Set(email_id),
                text: Set(text),
                html: Set(html),
                attachments: Set(attachments),
                is_sentinel: Set(is_sentinel),
                cached_at: Set(now.into()),
                expires_at: Set(expires_at.into()),
            };
            if let Err(err) = mail_body_cache::Entity::insert(model)
                .on_conflict(
                    sea_orm::sea_query::OnConflict::column(mail_body_cache::Column::EmailId)
                        .update_columns([
                            mail_body_cache::Column::Text,
                            mail_body_cache::Column::Html,
                            mail_body_cache::Column::Attachments,
                            mail_body_cache::Column::IsSentinel,
                            mail_body_cache::Column::CachedAt,
                            mail_body_cache::Column::ExpiresAt,
                        ])
                        .to_owned(),
                )
                .exec(&db)
                .await
            {
                tracing::warn!(%email_id, ?err, "warm tier write-back failed");
            }
        });
    }

    /// Returns `{text, html, attachments[]}` for `(email_id, connection_id)`,
    /// fetching through tier 2 then tier 3 on a tier-1 miss. `received_at`
    /// and the provider handle are supplied by the caller, which already
    /// holds the message's row and active connection.
    #[allow(clippy::too_many_arguments)]
    pub async fn get_body(
        &self,
        email_id: i32,
        connection_id: i32,
        external_id: &str,
        received_at: DateTime<Utc>,
        provider: &dyn MailProvider,
        access_token: &str,
    ) -> Result<MessageBody, AppError> {
        if let Some(body) = self.hot_get(email_id).await {
            return Ok(body);
        }

        let key: BodyKey = (email_id, connection_id);
        let result = self
            .resolve_flight
            .run(key, || async move {
                if let Some(body) = self.hot_get(email_id).await {
                    return Ok(body);
                }

                if let Some(cached) = self.warm_get(email_id).await {
                    self.hot_set(email_id, &cached).await;
                    return Ok(match cached {
                        CachedBody::Sentinel => empty_body(),
                        CachedBody::Body(body) => body,
                    });
                }

                self.fetch_flight
                    .run(key, || async move {
                        if let Some(body) = self.hot_get(email_id).await {
                            return Ok(body);
                        }

                        let fetched = provider
                            .get_message(access_token, external_id)
                            .await
                            .map_err(|e| CacheErrorTag::Provider(e.to_string()))?;

                        let cached = if fetched.text.is_empty() && fetched.html.is_empty() {
                            CachedBody::Sentinel
                        } else {
                            CachedBody::Body(fetched.clone())
                        };

                        self.hot_set(email_id, &cached).await;
                        self.warm_set_async(email_id, received_at, cached);

                        Ok(fetched)
                    })
                    .await
            })
            .await;

        result.map_err(|CacheErrorTag::Provider(msg)| {
            AppError::BadRequest(format!("provider fetch failed for message {email_id}: {msg}"))
        })
    }
}

fn empty_body() -> MessageBody {
    MessageBody { text: String::new(), html: String::new(), attachments: vec![] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_round_trips_through_encode_decode() {
        let encoded = CacheCore::encode(&CachedBody::Sentinel);
        match CacheCore::decode(&encoded) {
            Some(CachedBody::Sentinel) => {}
            other => panic!("expected sentinel, got {other:?}"),
        }
    }

    #[test]
    fn large_body_round_trips_under_compression() {
        let body = MessageBody {
            text: "x".repeat(cfg.cache.compression_threshold_bytes + 100),
            html: String::new(),
            attachments: vec![],
        };
        let encoded = CacheCore::encode(&CachedBody::Body(body.clone()));
        assert_eq!(encoded[0], GZIP_MAGIC);
        match CacheCore::decode(&encoded) {
            Some(CachedBody::Body(decoded)) => assert_eq!(decoded.text, body.text),
            other => panic!("expected body, got {other:?}"),
        }
    }

    #[test]
    fn small_body_round_trips_uncompressed() {
        let body = MessageBody { text: "hi".into(), html: String::new(), attachments: vec![] };
        let encoded = CacheCore::encode(&CachedBody::Body(body.clone()));
        assert_ne!(encoded[0], GZIP_MAGIC);
        match CacheCore::decode(&encoded) {
            Some(CachedBody::Body(decoded)) => assert_eq!(decoded.text, body.text),
            other => panic!("expected body, got {other:?}"),
        }
    }
}
