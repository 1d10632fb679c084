//! Microsoft Graph adapter. No direct teacher precedent — built in the same
//! shape as `gmail.rs` (reqwest + bearer auth + rate limiter + circuit
//! breaker), against the Graph REST surface instead of Gmail's.
use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream::FuturesUnordered, StreamExt};
use leaky_bucket::RateLimiter;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::{ProviderError, ProviderErrorKind};

use super::{types::*, CircuitBreaker, MailProvider};

macro_rules! graph_url {
    ($($params:expr),*) => {{
        const GRAPH_ENDPOINT: &str = "https://graph.microsoft.com/v1.0/me";
        let list_params: Vec<&str> = vec![$($params),*];
        format!("{}/{}", GRAPH_ENDPOINT, list_params.join("/"))
    }};
}

const BATCH_WIDTH: usize = 10;
const METADATA_TIMEOUT: Duration = Duration::from_secs(15);
const FULL_TIMEOUT: Duration = Duration::from_secs(30);
const ATTACHMENT_QUERY_CEILING: usize = 2000;

pub struct GraphProvider {
    http: reqwest::Client,
    rate_limiter: RateLimiter,
    breaker: CircuitBreaker,
}

impl GraphProvider {
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

    async fn get_json(&self, access_token: &str, url: &str, query: &[(&str, &str)]) -> Result<Value, ProviderError> {
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
        resp.json::<Value>().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))
    }

    fn parse_headers(payload: &Value) -> std::collections::HashMap<String, String> {
        let mut out = std::collections::HashMap::new();
        let Some(headers) = payload
            .get("internetMessageHeaders")
            .and_then(|h| h.as_array())
        else {
            return out;
        };
        for h in headers {
            let (Some(name), Some(value)) = (h.get("name").and_then(Value::as_str), h.get("value").and_then(Value::as_str)) else {
                continue;
            };
            if CLASSIFICATION_HEADER_WHITELIST.iter().any(|w| w.eq_ignore_ascii_case(name)) {
                out.insert(name.to_string(), value.to_string());
            }
        }
        out
    }

    fn summary_from_json(msg: &Value) -> Option<MessageSummary> {
        let id = msg.get("id")?.as_str()?.to_string();
        let headers = Self::parse_headers(msg);
        let labels: Vec<String> = msg
            .get("categories")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        let received_at = msg
            .get("receivedDateTime")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Some(MessageSummary {
            external_id: id,
            thread_id: msg.get("conversationId").and_then(Value::as_str).unwrap_or_default().to_string(),
            from: msg
                .get("from")
                .and_then(|f| f.get("emailAddress"))
                .and_then(|a| a.get("address"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            to: msg
                .get("toRecipients")
                .and_then(Value::as_array)
                .map(|recips| {
                    recips
                        .iter()
                        .filter_map(|r| r.get("emailAddress").and_then(|a| a.get("address")).and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default(),
            cc: String::new(),
            subject: msg.get("subject").and_then(Value::as_str).unwrap_or_default().to_string(),
            snippet: msg.get("bodyPreview").and_then(Value::as_str).unwrap_or_default().to_string(),
            is_read: msg.get("isRead").and_then(Value::as_bool).unwrap_or(false),
            is_starred: msg.get("flag").and_then(|f| f.get("flagStatus")).and_then(Value::as_str) == Some("flagged"),
            has_attachment: msg.get("hasAttachments").and_then(Value::as_bool).unwrap_or(false),
            folder: msg
                .get("parentFolderId")
                .and_then(Value::as_str)
                .unwrap_or("inbox")
                .to_string(),
            labels,
            received_at,
            headers,
        })
    }
}

#[async_trait]
impl MailProvider for GraphProvider {
    fn name(&self) -> &'static str {
        "graph"
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<(String, DateTime<Utc>), ProviderError> {
        Err(ProviderError::new(ProviderErrorKind::TokenExpired, "token refresh is an external collaborator"))
    }

    async fn validate_token(&self, access_token: &str) -> Result<bool, ProviderError> {
        match self.get_json(access_token, &graph_url!(), &[]).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.kind, ProviderErrorKind::TokenExpired) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn sync_initial(
        &self,
        access_token: &str,
        start_date: Option<DateTime<Utc>>,
        label_filter: Option<&str>,
    ) -> Result<ListPage, ProviderError> {
        let mut query: Vec<(&str, &str)> = vec![("$top", "150")];
        let filter_str;
        if let Some(start) = start_date {
            filter_str = format!("receivedDateTime ge {}", start.to_rfc3339());
            query.push(("$filter", &filter_str));
        } else if let Some(label) = label_filter {
            query.push(("$search", label));
        }
        let data = self.get_json(access_token, &graph_url!("messages"), &query).await?;
        let messages: Vec<MessageSummary> = data
            .get("value")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Self::summary_from_json).collect())
            .unwrap_or_default();
        Ok(ListPage { messages, next_page_token: data.get("@odata.nextLink").and_then(Value::as_str).map(String::from) })
    }

    async fn sync_incremental(&self, access_token: &str, sync_state: &str) -> Result<IncrementalSyncResult, ProviderError> {
        let url = if sync_state.starts_with("http") {
            sync_state.to_string()
        } else {
            graph_url!("messages", "delta")
        };
        let data = self
            .get_json(access_token, &url, &[])
            .await
            .map_err(|e| {
                if matches!(e.kind, ProviderErrorKind::NotFound) {
                    ProviderError::new(ProviderErrorKind::SyncRequired, "delta token expired")
                } else {
                    e
                }
            })?;

        let values = data.get("value").and_then(Value::as_array).cloned().unwrap_or_default();
        let mut new_messages = Vec::new();
        let mut deleted_ids = Vec::new();
        for v in &values {
            if v.get("@removed").is_some() {
                if let Some(id) = v.get("id").and_then(Value::as_str) {
                    deleted_ids.push(id.to_string());
                }
            } else if let Some(summary) = Self::summary_from_json(v) {
                new_messages.push(summary);
            }
        }

        let next_sync_state = data
            .get("@odata.deltaLink")
            .or_else(|| data.get("@odata.nextLink"))
            .and_then(Value::as_str)
            .unwrap_or(sync_state)
            .to_string();

        Ok(IncrementalSyncResult {
            new_messages,
            deleted_ids,
            has_more: data.get("@odata.nextLink").is_some(),
            next_sync_state,
        })
    }

    async fn watch_start(&self, access_token: &str) -> Result<String, ProviderError> {
        if self.breaker.try_acquire() == super::circuit_breaker::Permit::Denied {
            return Err(ProviderError::new(ProviderErrorKind::Server, "circuit open"));
        }
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post("https://graph.microsoft.com/v1.0/subscriptions")
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "changeType": "created,updated,deleted",
                "resource": "me/mailFolders('inbox')/messages",
                "expirationDateTime": (Utc::now() + chrono::Duration::hours(70)).to_rfc3339(),
            }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.map_status(status, resp.text().await.unwrap_or_default()));
        }
        self.breaker.record(true);
        let data: Value = resp.json().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))?;
        Ok(data.get("id").and_then(Value::as_str).unwrap_or_default().to_string())
    }

    async fn watch_stop(&self, access_token: &str, watch_id: &str) -> Result<(), ProviderError> {
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .delete(format!("https://graph.microsoft.com/v1.0/subscriptions/{watch_id}"))
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
        let data = self.get_json(access_token, &graph_url!("messages", external_id), &[]).await?;
        let text = data
            .get("body")
            .and_then(|b| b.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let is_html = data.get("body").and_then(|b| b.get("contentType")).and_then(Value::as_str) == Some("html");
        Ok(MessageBody {
            html: if is_html { text.clone() } else { String::new() },
            text: if is_html { String::new() } else { text },
            attachments: vec![],
        })
    }

    async fn get_messages_batch(&self, access_token: &str, external_ids: &[String], full_format: bool) -> Vec<MessageSummary> {
        let semaphore = Arc::new(Semaphore::new(BATCH_WIDTH));
        let timeout = if full_format { FULL_TIMEOUT } else { METADATA_TIMEOUT };
        let select = if full_format {
            "id,conversationId,from,toRecipients,subject,bodyPreview,isRead,flag,hasAttachments,parentFolderId,receivedDateTime,internetMessageHeaders,body"
        } else {
            "id,conversationId,from,toRecipients,subject,bodyPreview,isRead,flag,hasAttachments,parentFolderId,receivedDateTime,internetMessageHeaders"
        };

        let mut tasks = FuturesUnordered::new();
        for (idx, id) in external_ids.iter().cloned().enumerate() {
            let access_token = access_token.to_string();
            let this_url = graph_url!("messages", &id);
            let http = self.http.clone();
            let semaphore = semaphore.clone();
            tasks.push(async move {
                let Ok(_permit) = semaphore.acquire().await else { return (idx, None) };
                let fetch = http.get(&this_url).bearer_auth(&access_token).query(&[("$select", select)]).send();
                let result = tokio::time::timeout(timeout, fetch).await;
                let summary = match result {
                    Ok(Ok(resp)) if resp.status().is_success() => {
                        resp.json::<Value>().await.ok().and_then(|v| GraphProvider::summary_from_json(&v))
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
        let data = self
            .get_json(access_token, &graph_url!("messages"), &[("$filter", "hasAttachments eq true")])
            .await?;
        let ids: HashSet<String> = data
            .get("value")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|m| m.get("id").and_then(Value::as_str).map(String::from)).collect())
            .unwrap_or_default();
        Ok(candidate_ids.iter().filter(|id| ids.contains(*id)).cloned().collect())
    }

    async fn list_messages(&self, access_token: &str, query: &ListQuery) -> Result<ListPage, ProviderError> {
        let mut q: Vec<(&str, &str)> = vec![];
        let limit_str = query.limit.to_string();
        q.push(("$top", &limit_str));
        if let Some(search) = &query.search {
            q.push(("$search", search));
        }
        let url = query.page_token.clone().unwrap_or_else(|| graph_url!("messages"));
        let empty_query: Vec<(&str, &str)> = vec![];
        let effective_query = if query.page_token.is_some() { &empty_query } else { &q };
        let data = self.get_json(access_token, &url, effective_query).await?;
        let messages: Vec<MessageSummary> = data
            .get("value")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Self::summary_from_json).collect())
            .unwrap_or_default();
        Ok(ListPage { messages, next_page_token: data.get("@odata.nextLink").and_then(Value::as_str).map(String::from) })
    }

    async fn send_message(&self, access_token: &str, raw_rfc822: &str) -> Result<String, ProviderError> {
        let message = mail_parser::MessageParser::default()
            .parse(raw_rfc822.as_bytes())
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::Other, "failed to parse rfc822 message"))?;
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(graph_url!("sendMail"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "message": {
                    "subject": message.subject().unwrap_or_default(),
                    "body": { "contentType": "Text", "content": message.body_text(0).unwrap_or_default() },
                },
                "saveToSentItems": true,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()));
        }
        Ok(String::new())
    }

    async fn create_draft(&self, access_token: &str, raw_rfc822: &str) -> Result<String, ProviderError> {
        let message = mail_parser::MessageParser::default()
            .parse(raw_rfc822.as_bytes())
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::Other, "failed to parse rfc822 message"))?;
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(graph_url!("messages"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "subject": message.subject().unwrap_or_default(),
                "body": { "contentType": "Text", "content": message.body_text(0).unwrap_or_default() },
            }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()));
        }
        let data: Value = resp.json().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))?;
        Ok(data.get("id").and_then(Value::as_str).unwrap_or_default().to_string())
    }

    async fn modify_message(&self, access_token: &str, external_id: &str, mutation: MutationKind) -> Result<(), ProviderError> {
        let body = mutation_patch_body(mutation);
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .patch(graph_url!("messages", external_id))
            .bearer_auth(access_token)
            .json(&body)
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
        let body = mutation_patch_body(mutation);
        let requests: Vec<Value> = external_ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                serde_json::json!({
                    "id": i.to_string(),
                    "method": "PATCH",
                    "url": format!("/me/messages/{id}"),
                    "body": body,
                    "headers": { "Content-Type": "application/json" },
                })
            })
            .collect();
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post("https://graph.microsoft.com/v1.0/$batch")
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "requests": requests }))
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
        let data = self.get_json(access_token, &graph_url!("messages", external_id), &[("$select", "categories")]).await?;
        let mut categories: Vec<String> = data
            .get("categories")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        if !categories.iter().any(|c| c == label) {
            categories.push(label.to_string());
        }
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .patch(graph_url!("messages", external_id))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "categories": categories }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()))
    }

    async fn remove_label(&self, access_token: &str, external_id: &str, label: &str) -> Result<(), ProviderError> {
        let data = self.get_json(access_token, &graph_url!("messages", external_id), &[("$select", "categories")]).await?;
        let categories: Vec<String> = data
            .get("categories")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).filter(|c| c != label).collect())
            .unwrap_or_default();
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .patch(graph_url!("messages", external_id))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "categories": categories }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()))
    }

    async fn list_labels(&self, access_token: &str) -> Result<Vec<String>, ProviderError> {
        let data = self.get_json(access_token, "https://graph.microsoft.com/v1.0/me/outlook/masterCategories", &[]).await?;
        Ok(data
            .get("value")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|l| l.get("displayName").and_then(Value::as_str).map(String::from)).collect())
            .unwrap_or_default())
    }

    async fn get_attachment_bytes(&self, access_token: &str, message_id: &str, attachment_id: &str) -> Result<Vec<u8>, ProviderError> {
        use base64::{engine::general_purpose::STANDARD, Engine};
        let data = self
            .get_json(access_token, &graph_url!("messages", message_id, "attachments", attachment_id), &[])
            .await?;
        let encoded = data.get("contentBytes").and_then(Value::as_str).unwrap_or_default();
        STANDARD.decode(encoded).map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))
    }

    async fn create_upload_session(&self, access_token: &str, filename: &str, total_size: u64) -> Result<UploadSession, ProviderError> {
        self.rate_limiter.acquire(1).await;
        let resp = self
            .http
            .post(graph_url!("messages", "createUploadSession"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "AttachmentItem": {
                    "attachmentType": "file",
                    "name": filename,
                    "size": total_size,
                }
            }))
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;

        if !resp.status().is_success() {
            return Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()));
        }
        let data: Value = resp.json().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))?;
        let upload_url = data.get("uploadUrl").and_then(Value::as_str).unwrap_or_default().to_string();
        let expires_at = data
            .get("expirationDateTime")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc::now() + chrono::Duration::hours(1));

        Ok(UploadSession {
            session_id: uuid::Uuid::new_v4().to_string(),
            upload_url,
            expires_at,
            chunk_size: 4 * 1024 * 1024,
            max_chunk_size: 4 * 1024 * 1024,
        })
    }

    async fn upload_status(&self, _access_token: &str, session: &UploadSession) -> Result<UploadStatus, ProviderError> {
        let resp = self
            .http
            .get(&session.upload_url)
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::Server, e.to_string()))?;
        if !resp.status().is_success() {
            return Err(self.map_status(resp.status(), resp.text().await.unwrap_or_default()));
        }
        let data: Value = resp.json().await.map_err(|e| ProviderError::new(ProviderErrorKind::Other, e.to_string()))?;
        let next_ranges = data.get("nextExpectedRanges").and_then(Value::as_array).cloned().unwrap_or_default();
        let next_range_start = next_ranges
            .first()
            .and_then(Value::as_str)
            .and_then(|r| r.split('-').next())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0);
        Ok(UploadStatus {
            bytes_uploaded: next_range_start,
            next_range_start,
            is_complete: next_ranges.is_empty(),
            attachment_id: data.get("id").and_then(Value::as_str).map(String::from),
        })
    }

    async fn cancel_upload(&self, _access_token: &str, session: &UploadSession) -> Result<(), ProviderError> {
        let resp = self
            .http
            .delete(&session.upload_url)
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

fn mutation_patch_body(mutation: MutationKind) -> Value {
    match mutation {
        MutationKind::MarkRead => serde_json::json!({ "isRead": true }),
        MutationKind::MarkUnread => serde_json::json!({ "isRead": false }),
        MutationKind::Star => serde_json::json!({ "flag": { "flagStatus": "flagged" } }),
        MutationKind::Unstar => serde_json::json!({ "flag": { "flagStatus": "notFlagged" } }),
        MutationKind::Archive | MutationKind::Trash | MutationKind::Restore | MutationKind::Delete => {
            serde_json::json!({})
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn graph_url_joins_segments() {
        let url = graph_url!("messages");
        assert_eq!(url, "https://graph.microsoft.com/v1.0/me/messages");
    }

    #[test]
    fn mutation_patch_body_sets_read_flag() {
        let body = super::mutation_patch_body(super::MutationKind::MarkRead);
        assert_eq!(body["isRead"], true);
    }
}
