//! Gmail adapter. Grounded on the teacher's `email/client.rs`: the
//! `gmail_url!` macro, bearer-token reqwest calls, a
//! `leaky_bucket::RateLimiter` per adapter instance, and typed deserialization
//! into `google_gmail1::api::*` response structs instead of raw JSON
//! field-walking, now implementing the full `MailProvider` capability set
//! instead of a Gmail-only surface.
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::{stream::FuturesUnordered, StreamExt};
use google_gmail1::api::{History, Label, ListHistoryResponse, ListLabelsResponse, ListMessagesResponse, Message, MessagePart, Profile, WatchResponse};
use leaky_bucket::RateLimiter;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::error::{ProviderError, ProviderErrorKind};

use super::{
    types::*, CircuitBreaker, MailProvider,
};

macro_rules! gmail_url {
    ($($params:expr),*) => {{
        const GMAIL_ENDPOINT: &str = "https://www.googleapis.com/gmail/v1/users/me";
        let list_params: Vec<&str> = vec![$($params),*];
        format!("{}/{}", GMAIL_ENDPOINT, list_params.join("/"))
    }};
}

const BATCH_WIDTH: usize = 10;
const METADATA_TIMEOUT: Duration = Duration::from_secs(15);
const FULL_TIMEOUT: Duration = Duration::from_secs(30);
const ATTACHMENT_QUERY_CEILING: usize = 2000;

pub struct GmailProvider {
    http: reqwest::Client,
    rate_limiter: RateLimiter,
    breaker: CircuitBreaker,
}

impl GmailProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            rate_limiter: RateLimiter::builder()
                .initial(20)
                .interval(Duration::from_secs(1))
                .refill(20)
                .build(),
            breaker: CircuitBreaker::new(),
        }
    }

    fn map_status(&self, status: reqwest::StatusCode, body: impl Into<String>) -> ProviderError {
        let err = ProviderError::from_status(status, body);
        self.breaker.record(!err.trips_breaker());
        err
    }

    async fn get<T: DeserializeOwned>(&self, access_token: &str, url: &str, query: &[(&str, &str)]) -> Result<T, ProviderError> {
        if self.breaker.try_acquire() == super::circuit_breaker::Permit::Denied {
            return Err(ProviderError::new(ProviderErrorKind::Server, "circuit open"));
        }
        self.rate_limiter.acquire(1).await;

        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.map_status(status, body));
        }
        self.breaker.record(true);
        resp.json::<T>().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))
    }

    fn parse_headers(payload: Option<&MessagePart>) -> HashMap<String, String> {
        let mut out = HashMap::new();
        let Some(headers) = payload.and_then(|p| p.headers.as_ref()) else {
            return out;
        };
        for h in headers {
            let (Some(name), Some(value)) = (h.name.as_deref(), h.value.as_deref()) else {
                continue;
            };
            if CLASSIFICATION_HEADER_WHITELIST.iter().any(|w| w.eq_ignore_ascii_case(name)) {
                out.insert(name.to_string(), value.to_string());
            }
        }
        out
    }

    fn summary_from_message(msg: &Message) -> Option<MessageSummary> {
        let id = msg.id.clone()?;
        let headers = Self::parse_headers(msg.payload.as_ref());
        let labels = msg.label_ids.clone().unwrap_or_default();
        let internal_ms = msg.internal_date.unwrap_or(0);
        let received_at = Utc.timestamp_millis_opt(internal_ms).single().unwrap_or_else(Utc::now);

        Some(MessageSummary {
            external_id: id,
            thread_id: msg.thread_id.clone().unwrap_or_default(),
            from: headers.get("From").cloned().unwrap_or_default(),
            to: headers.get("To").cloned().unwrap_or_default(),
            cc: headers.get("Cc").cloned().unwrap_or_default(),
            subject: headers.get("Subject").cloned().unwrap_or_default(),
            snippet: msg.snippet.clone().unwrap_or_default(),
            is_read: !labels.iter().any(|l| l == "UNREAD"),
            is_starred: labels.iter().any(|l| l == "STARRED"),
            has_attachment: false,
            folder: if labels.iter().any(|l| l == "INBOX") { "inbox".into() } else { "other".into() },
            labels,
            received_at,
            headers,
        })
    }
}

#[async_trait]
impl MailProvider for GmailProvider {
    fn name(&self) -> &'static str {
        "gmail"
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<(String, DateTime<Utc>), ProviderError> {
        // OAuth code-exchange surface is out of scope; callers supply the
        // refreshed token via the ambient token-refresh collaborator.
        Err(ProviderError::new(ProviderErrorKind::TokenExpired, "token refresh is an external collaborator"))
    }

    async fn validate_token(&self, access_token: &str) -> Result<bool, ProviderError> {
        match self.get::<Profile>(access_token, "https://www.googleapis.com/gmail/v1/users/me/profile", &[]).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.kind, ProviderErrorKind::TokenExpired) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn sync_initial(
        &self,
        access_token: &str,
        _start_date: Option<DateTime<Utc>>,
        label_filter: Option<&str>,
    ) -> Result<ListPage, ProviderError> {
        let mut query: Vec<(&str, &str)> = vec![("maxResults", "150")];
        if let Some(label) = label_filter {
            query.push(("q", label));
        }
        let data = self.get::<ListMessagesResponse>(access_token, &gmail_url!("messages"), &query).await?;
        let refs: Vec<String> = data.messages.unwrap_or_default().into_iter().filter_map(|m| m.id).collect();
        let messages = self.get_messages_batch(access_token, &refs, false).await;
        Ok(ListPage { messages, next_page_token: data.next_page_token })
    }

    async fn sync_incremental(&self, access_token: &str, sync_state: &str) -> Result<IncrementalSyncResult, ProviderError> {
        let data = self
            .get::<ListHistoryResponse>(access_token, &gmail_url!("history"), &[("startHistoryId", sync_state)])
            .await
            .map_err(|e| {
                if matches!(e.kind, ProviderErrorKind::NotFound) {
                    ProviderError::new(ProviderErrorKind::SyncRequired, "history id expired")
                } else {
                    e
                }
            })?;

        let history: Vec<History> = data.history.unwrap_or_default();
        let mut added_ids = Vec::new();
        let mut deleted_ids = Vec::new();
        for h in &history {
            for added in h.messages_added.iter().flatten() {
                if let Some(id) = added.message.as_ref().and_then(|m| m.id.clone()) {
                    added_ids.push(id);
                }
            }
            for deleted in h.messages_deleted.iter().flatten() {
                if let Some(id) = deleted.message.as_ref().and_then(|m| m.id.clone()) {
                    deleted_ids.push(id);
                }
            }
        }

        let new_messages = self.get_messages_batch(access_token, &added_ids, false).await;
        let next_sync_state = data.history_id.map(|h| h.to_string()).unwrap_or_else(|| sync_state.to_string());

        Ok(IncrementalSyncResult {
            new_messages,
            deleted_ids,
            next_sync_state,
            has_more: data.next_page_token.is_some(),
        })
    }

    async fn watch_start(&self, access_token: &str) -> Result<String, ProviderError> {
        if self.breaker.try_acquire() == super::circuit_breaker::Permit::Denied {
            return Err(ProviderError::new(ProviderErrorKind::Server, "circuit open"));
        }
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(gmail_url!("watch"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.map_status(status, resp.text().await.unwrap_or_default()));
        }
        self.breaker.record(true);
        let data = resp.json::<WatchResponse>().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))?;
        Ok(data.history_id.map(|h| h.to_string()).unwrap_or_default())
    }

    async fn watch_stop(&self, access_token: &str, _watch_id: &str) -> Result<(), ProviderError> {
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(gmail_url!("stop"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND || resp.status().is_success() {
            return Ok(());
        }
        Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()))
    }

    async fn get_message(&self, access_token: &str, external_id: &str) -> Result<MessageBody, ProviderError> {
        let data = self.get::<Message>(access_token, &gmail_url!("messages", external_id), &[("format", "FULL")]).await?;
        let text = data.snippet.unwrap_or_default();
        Ok(MessageBody { text, html: String::new(), attachments: vec![] })
    }

    async fn get_messages_batch(&self, access_token: &str, external_ids: &[String], full_format: bool) -> Vec<MessageSummary> {
        let semaphore = Arc::new(Semaphore::new(BATCH_WIDTH));
        let timeout = if full_format { FULL_TIMEOUT } else { METADATA_TIMEOUT };
        let format = if full_format { "FULL" } else { "METADATA" };

        let mut tasks = FuturesUnordered::new();
        for (idx, id) in external_ids.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let access_token = access_token.to_string();
            let this_url = gmail_url!("messages", &id);
            let http = self.http.clone();
            tasks.push(async move {
                let Ok(_permit) = semaphore.acquire().await else { return (idx, None) };
                let fetch = http.get(&this_url).bearer_auth(&access_token).query(&[("format", format)]).send();
                let result = tokio::time::timeout(timeout, fetch).await;
                let summary = match result {
                    Ok(Ok(resp)) if resp.status().is_success() => {
                        resp.json::<Message>().await.ok().and_then(|m| GmailProvider::summary_from_message(&m))
                    }
                    _ => None,
                };
                (idx, summary)
            });
        }

        let mut indexed = Vec::new();
        while let Some((idx, summary)) = tasks.next().await {
            if let Some(summary) = summary {
                indexed.push((idx, summary));
            }
        }
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, s)| s).collect()
    }

    async fn ids_with_attachments(&self, access_token: &str, candidate_ids: &[String]) -> Result<HashSet<String>, ProviderError> {
        if candidate_ids.len() > ATTACHMENT_QUERY_CEILING {
            return Err(ProviderError::new(ProviderErrorKind::Other, "candidate set exceeds safety ceiling"));
        }
        let data = self.get::<ListMessagesResponse>(access_token, &gmail_url!("messages"), &[("q", "has:attachment")]).await?;
        let ids: HashSet<String> = data.messages.unwrap_or_default().into_iter().filter_map(|m| m.id).collect();
        Ok(candidate_ids.iter().filter(|id| ids.contains(*id)).cloned().collect())
    }

    async fn list_messages(&self, access_token: &str, query: &ListQuery) -> Result<ListPage, ProviderError> {
        let mut q: Vec<(&str, &str)> = vec![("maxResults", "100")];
        let limit_str = query.limit.to_string();
        q.push(("maxResults", &limit_str));
        if let Some(token) = &query.page_token {
            q.push(("pageToken", token));
        }
        if let Some(search) = &query.search {
            q.push(("q", search));
        }
        let data = self.get::<ListMessagesResponse>(access_token, &gmail_url!("messages"), &q).await?;
        let refs: Vec<String> = data.messages.unwrap_or_default().into_iter().filter_map(|m| m.id).collect();
        let messages = self.get_messages_batch(access_token, &refs, false).await;
        Ok(ListPage { messages, next_page_token: data.next_page_token })
    }

    async fn send_message(&self, access_token: &str, raw_rfc822: &str) -> Result<String, ProviderError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        self.rate_limiter.acquire(1).await;
        let raw = URL_SAFE_NO_PAD.encode(raw_rfc822);
        let resp = self
            .http
            .post(gmail_url!("messages", "send"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()));
        }
        let data = resp.json::<Message>().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))?;
        Ok(data.id.unwrap_or_default())
    }

    async fn create_draft(&self, access_token: &str, raw_rfc822: &str) -> Result<String, ProviderError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        self.rate_limiter.acquire(1).await;
        let raw = URL_SAFE_NO_PAD.encode(raw_rfc822);
        let resp = self
            .http
            .post(gmail_url!("drafts"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "message": { "raw": raw } }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()));
        }
        let data = resp.json::<Message>().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))?;
        Ok(data.id.unwrap_or_default())
    }

    async fn modify_message(&self, access_token: &str, external_id: &str, mutation: MutationKind) -> Result<(), ProviderError> {
        let (add, remove) = mutation_label_diff(mutation);
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(gmail_url!("messages", external_id, "modify"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "addLabelIds": add, "removeLabelIds": remove }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if resp.status().is_success() {
            self.breaker.record(true);
            return Ok(());
        }
        Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()))
    }

    async fn batch_modify(&self, access_token: &str, external_ids: &[String], mutation: MutationKind) -> Result<(), ProviderError> {
        let (add, remove) = mutation_label_diff(mutation);
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(gmail_url!("messages", "batchModify"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "ids": external_ids, "addLabelIds": add, "removeLabelIds": remove }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if resp.status().is_success() {
            self.breaker.record(true);
            return Ok(());
        }
        Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()))
    }

    async fn add_label(&self, access_token: &str, external_id: &str, label: &str) -> Result<(), ProviderError> {
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(gmail_url!("messages", external_id, "modify"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "addLabelIds": [label], "removeLabelIds": [] }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()))
    }

    async fn remove_label(&self, access_token: &str, external_id: &str, label: &str) -> Result<(), ProviderError> {
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(gmail_url!("messages", external_id, "modify"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "addLabelIds": [], "removeLabelIds": [label] }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()))
    }

    async fn list_labels(&self, access_token: &str) -> Result<Vec<String>, ProviderError> {
        let data = self.get::<ListLabelsResponse>(access_token, &gmail_url!("labels"), &[]).await?;
        Ok(data.labels.unwrap_or_default().into_iter().filter_map(|l: Label| l.name).collect())
    }

    async fn get_attachment_bytes(&self, access_token: &str, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, ProviderError> {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        let data = self
            .get::<serde_json::Value>(access_token, &gmail_url!("messages", message_id, "attachments", attachment_id), &[])
            .await?;
        let encoded = data.get("data").and_then(serde_json::Value::as_str).unwrap_or_default();
        URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))
    }

    async fn create_upload_session(&self, access_token: &str, filename: &str, total_size: u64) -> Result<UploadSession, ProviderError> {
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post("https://www.googleapis.com/upload/gmail/v1/users/me/messages/send?uploadType=resumable")
            .bearer_auth(access_token)
            .header("X-Upload-Content-Type", "message/rfc822")
            .json(&serde_json::json!({ "name": filename, "size": total_size }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;

        if !resp.status().is_success() {
            return Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()));
        }

        let upload_url = resp
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(UploadSession {
            session_id: uuid::Uuid::new_v4().to_string(),
            upload_url,
            expires_at: Utc::now() + chrono::Duration::hours(1),
            chunk_size: 8 * 1024 * 1024,
            max_chunk_size: 16 * 1024 * 1024,
        })
    }

    async fn upload_status(&self, access_token: &str, session: &UploadSession) -> Result<UploadStatus, ProviderError> {
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .put(&session.upload_url)
            .bearer_auth(access_token)
            .header("Content-Range", "bytes */*")
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;

        let bytes_uploaded = resp
            .headers()
            .get("Range")
            .and_then(|v| v.to_str().ok())
            .and_then(|r| r.rsplit('-').next())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0);

        let is_complete = resp.status().is_success();
        Ok(UploadStatus {
            bytes_uploaded,
            next_range_start: bytes_uploaded + if is_complete { 0 } else { 1 },
            is_complete,
            attachment_id: None,
        })
    }

    async fn cancel_upload(&self, access_token: &str, session: &UploadSession) -> Result<(), ProviderError> {
        let resp = self
            .http
            .delete(&session.upload_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if resp.status().is_success() || resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()))
    }

    fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

fn mutation_label_diff(mutation: MutationKind) -> (Vec<&'static str>, Vec<&'static str>) {
    match mutation {
        MutationKind::MarkRead => (vec![], vec!["UNREAD"]),
        MutationKind::MarkUnread => (vec!["UNREAD"], vec![]),
        MutationKind::Star => (vec!["STARRED"], vec![]),
        MutationKind::Unstar => (vec![], vec!["STARRED"]),
        MutationKind::Archive => (vec![], vec!["INBOX"]),
        MutationKind::Trash => (vec!["TRASH"], vec!["INBOX"]),
        MutationKind::Restore => (vec!["INBOX"], vec!["TRASH"]),
        MutationKind::Delete => (vec!["TRASH"], vec![]),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn gmail_url_joins_segments() {
        let url = gmail_url!("messages");
        assert_eq!(url, "https://www.googleapis.com/gmail/v1/users/me/messages");
        let url = gmail_url!("messages", "123");
        assert_eq!(url, "https://www.googleapis.com/gmail/v1/users/me/messages/123");
    }

    #[test]
    fn mutation_label_diff_is_symmetric() {
        let (add, remove) = super::mutation_label_diff(super::MutationKind::Star);
        assert_eq!(add, vec!["STARRED"]);
        assert!(remove.is_empty());
    }
}
