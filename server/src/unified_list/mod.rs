//! Unified multi-account list (§4.5): merges the local store with each
//! connection's live provider page, bounded-parallel gather at semaphore
//! width 5, deduplicated by `external_id`.
pub mod cursor;

use std::sync::Arc;

use chrono::Utc;
use entity::mail_message;
use futures::{stream::FuturesUnordered, StreamExt};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tokio::sync::Semaphore;

use crate::provider::{ListQuery, MailProvider, MessageSummary};

use cursor::CursorState;

const GATHER_WIDTH: usize = 5;

pub struct ConnectionHandle {
    pub connection_id: i32,
    pub provider: Arc<dyn MailProvider>,
    pub access_token: String,
}

pub struct UnifiedListQuery {
    pub user_id: i32,
    pub limit: usize,
    pub cursor: Option<String>,
    pub folder: Option<String>,
    pub search: Option<String>,
}

pub struct UnifiedListResult {
    pub emails: Vec<MessageSummary>,
    pub total: u64,
    pub has_more: bool,
    pub next_cursor: String,
}

fn to_summary(row: mail_message::Model) -> MessageSummary {
    let labels: Vec<String> = serde_json::from_value(row.labels).unwrap_or_default();
    MessageSummary {
        external_id: row.external_id,
        thread_id: row.thread_id,
        from: row.from_addr,
        to: row.to_addr,
        cc: row.cc_addr,
        subject: row.subject,
        snippet: row.snippet,
        labels,
        folder: row.folder,
        is_read: row.is_read,
        is_starred: row.is_starred,
        has_attachment: row.has_attachment,
        received_at: row.received_at.with_timezone(&Utc),
        headers: Default::default(),
    }
}

pub async fn list(db: &DatabaseConnection, connections: &[ConnectionHandle], query: UnifiedListQuery) -> UnifiedListResult {
    let mut cursor = query.cursor.as_deref().map(CursorState::decode).unwrap_or_default();

    let mut local_query = mail_message::Entity::find().filter(mail_message::Column::UserId.eq(query.user_id));
    if let Some(folder) = &query.folder {
        local_query = local_query.filter(mail_message::Column::Folder.eq(folder.as_str()));
    }
    if let Some(search) = &query.search {
        local_query = local_query.filter(mail_message::Column::Subject.contains(search.as_str()));
    }

    let db_total = local_query.clone().count(db).await.unwrap_or(0);

    let mut db_rows: Vec<mail_message::Model> = Vec::new();
    if !cursor.db_exhausted {
        db_rows = local_query
            .order_by(mail_message::Column::ReceivedAt, Order::Desc)
            .offset(cursor.db_offset)
            .limit(query.limit as u64)
            .all(db)
            .await
            .unwrap_or_default();

        if (db_rows.len() as u64) < query.limit as u64 {
            cursor.db_exhausted = true;
        }
        cursor.db_offset += db_rows.len() as u64;
    }

    let mut merged: Vec<MessageSummary> = db_rows.into_iter().map(to_summary).collect();
    let mut seen: std::collections::HashSet<String> = merged.iter().map(|m| m.external_id.clone()).collect();

    let needed = query.limit.saturating_sub(merged.len());
    if needed > 0 {
        let candidates: Vec<&ConnectionHandle> = connections.iter().filter(|c| !cursor.is_connection_exhausted(c.connection_id)).collect();

        let semaphore = Arc::new(Semaphore::new(GATHER_WIDTH));
        let mut tasks = FuturesUnordered::new();
        for handle in candidates {
            let semaphore = semaphore.clone();
            let connection_id = handle.connection_id;
            let provider = handle.provider.clone();
            let access_token = handle.access_token.clone();
            let page_token = cursor.connection_token(connection_id);
            let list_query = ListQuery { folder: query.folder.clone(), search: query.search.clone(), page_token, limit: needed };
            tasks.push(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (connection_id, None);
                };
                (connection_id, provider.list_messages(&access_token, &list_query).await.ok())
            });
        }

        while let Some((connection_id, page)) = tasks.next().await {
            match page {
                Some(page) => {
                    cursor.connection_tokens.insert(connection_id, page.next_page_token.clone());
                    cursor.connection_exhausted.insert(connection_id, page.next_page_token.is_none());
                    for message in page.messages {
                        if seen.insert(message.external_id.clone()) {
                            merged.push(message);
                        }
                    }
                }
                None => {
                    tracing::warn!(connection_id, "provider list request failed, skipping this page");
                }
            }
        }
    }

    merged.sort_by(|a, b| b.received_at.cmp(&a.received_at));
    merged.truncate(query.limit);

    let any_connection_open = connections.iter().any(|c| !cursor.is_connection_exhausted(c.connection_id));
    let db_has_more = !cursor.db_exhausted && cursor.db_offset < db_total;
    let has_more = db_has_more || any_connection_open;

    cursor.last_received_at = merged.last().map(|m| m.received_at);

    UnifiedListResult { emails: merged, total: db_total, has_more, next_cursor: cursor.encode() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_prefers_local_rows_over_provider_rows() {
        let local = MessageSummary {
            external_id: "x1".into(),
            thread_id: String::new(),
            from: "local".into(),
            to: String::new(),
            cc: String::new(),
            subject: String::new(),
            snippet: String::new(),
            labels: vec![],
            folder: "inbox".into(),
            is_read: false,
            is_starred: false,
            has_attachment: false,
            received_at: Utc::now(),
            headers: Default::default(),
        };
        let mut seen = std::collections::HashSet::new();
        seen.insert(local.external_id.clone());
        assert!(!seen.insert("x1".into()));
    }
}
