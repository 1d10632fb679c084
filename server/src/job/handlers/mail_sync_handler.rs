//! `mail:sync` handler: incremental sync for one connection (§4.1 "sync
//! progress", §7 sync-cursor-lost handling). Persists new messages, fans out
//! an `ai:classify` job per new message, and reports progress over the
//! real-time bus.
use async_trait::async_trait;
use chrono::Utc;
use entity::{connection, mail_message};
use sea_orm::{sea_query::OnConflict, ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ProviderErrorKind;
use crate::job::JobHandler;
use crate::provider::{gmail::GmailProvider, graph::GraphProvider, MailProvider};
use crate::realtime::SharedRealtimeBus;
use crate::stream::{topics, StreamBackend};

#[derive(Debug, Deserialize)]
struct SyncJob {
    connection_id: i32,
    sync_state: Option<String>,
}

pub struct MailSyncHandler {
    pub db: sea_orm::DatabaseConnection,
    pub http: reqwest::Client,
    pub stream: Arc<dyn StreamBackend>,
    pub realtime: SharedRealtimeBus,
}

fn provider_for(kind: &connection::ProviderKind, http: reqwest::Client) -> Arc<dyn MailProvider> {
    match kind {
        connection::ProviderKind::Gmail => Arc::new(GmailProvider::new(http)),
        connection::ProviderKind::Graph => Arc::new(GraphProvider::new(http)),
    }
}

#[async_trait]
impl JobHandler for MailSyncHandler {
    async fn handle(&self, payload: &str) -> anyhow::Result<()> {
        let job: SyncJob = serde_json::from_str(payload)?;

        let Some(conn_row) = connection::Entity::find_by_id(job.connection_id).one(&self.db).await? else {
            tracing::warn!(connection_id = job.connection_id, "sync job referenced a missing connection");
            return Ok(());
        };

        let provider = provider_for(&conn_row.provider, self.http.clone());

        let (new_messages, next_sync_state) = match &job.sync_state {
            Some(state) => match provider.sync_incremental(&conn_row.access_token, state).await {
                Ok(delta) => (delta.new_messages, delta.next_sync_state),
                Err(err) if err.kind == ProviderErrorKind::SyncRequired => {
                    tracing::warn!(connection_id = job.connection_id, "sync cursor lost, falling back to full sync");
                    let page = provider.sync_initial(&conn_row.access_token, None, None).await?;
                    (page.messages, page.next_page_token.unwrap_or_default())
                }
                Err(err) => return Err(err.into()),
            },
            None => {
                let page = provider.sync_initial(&conn_row.access_token, None, None).await?;
                (page.messages, page.next_page_token.unwrap_or_default())
            }
        };

        let mut new_ids = Vec::with_capacity(new_messages.len());
        for message in &new_messages {
            let model = mail_message::ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                connection_id: Set(job.connection_id),
                user_id: Set(conn_row.user_id),
                external_id: Set(message.external_id.clone()),
                thread_id: Set(message.thread_id.clone()),
                from_addr: Set(message.from.clone()),
                to_addr: Set(message.to.clone()),
                cc_addr: Set(message.cc.clone()),
                subject: Set(message.subject.clone()),
                snippet: Set(message.snippet.clone()),
                labels: Set(serde_json::to_value(&message.labels)?),
                folder: Set(message.folder.clone()),
                is_read: Set(message.is_read),
                is_starred: Set(message.is_starred),
                has_attachment: Set(message.has_attachment),
                received_at: Set(message.received_at.into()),
                created_at: Set(Utc::now().into()),
                classification_headers: Set(serde_json::to_value(&message.headers)?),
            };

            let inserted = mail_message::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([mail_message::Column::ConnectionId, mail_message::Column::ExternalId])
                        .update_columns([
                            mail_message::Column::Labels,
                            mail_message::Column::IsRead,
                            mail_message::Column::IsStarred,
                            mail_message::Column::ClassificationHeaders,
                        ])
                        .to_owned(),
                )
                .exec_with_returning(&self.db)
                .await?;
            new_ids.push(inserted.id);
        }

        for email_id in &new_ids {
            let payload = serde_json::json!({"user_id": conn_row.user_id, "email_id": email_id}).to_string();
            self.stream.publish(topics::AI_CLASSIFY, &payload).await?;
        }

        self.realtime
            .push(
                conn_row.user_id,
                "sync.progress",
                serde_json::json!({"connection_id": job.connection_id, "synced_emails": new_ids.len()}),
            )
            .await;

        tracing::info!(connection_id = job.connection_id, new = new_ids.len(), next_sync_state, "sync batch complete");
        Ok(())
    }
}
