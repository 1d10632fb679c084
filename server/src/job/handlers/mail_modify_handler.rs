//! `mail:modify` handler: applies a mutation (read/star/archive/trash/...)
//! against the provider, then mirrors it onto the local row so unified-list
//! reads stay consistent without waiting for the next sync pass.
use async_trait::async_trait;
use entity::{connection, mail_message};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;

use crate::job::JobHandler;
use crate::provider::{gmail::GmailProvider, graph::GraphProvider, MailProvider, MutationKind};

#[derive(Debug, Deserialize)]
struct ModifyJob {
    connection_id: i32,
    external_id: String,
    mutation: MutationKindWire,
}

#[derive(Debug, Deserialize)]
enum MutationKindWire {
    MarkRead,
    MarkUnread,
    Star,
    Unstar,
    Archive,
    Trash,
    Restore,
    Delete,
}

impl From<MutationKindWire> for MutationKind {
    fn from(wire: MutationKindWire) -> Self {
        match wire {
            MutationKindWire::MarkRead => MutationKind::MarkRead,
            MutationKindWire::MarkUnread => MutationKind::MarkUnread,
            MutationKindWire::Star => MutationKind::Star,
            MutationKindWire::Unstar => MutationKind::Unstar,
            MutationKindWire::Archive => MutationKind::Archive,
            MutationKindWire::Trash => MutationKind::Trash,
            MutationKindWire::Restore => MutationKind::Restore,
            MutationKindWire::Delete => MutationKind::Delete,
        }
    }
}

pub struct MailModifyHandler {
    pub db: sea_orm::DatabaseConnection,
    pub http: reqwest::Client,
}

fn provider_for(kind: &connection::ProviderKind, http: reqwest::Client) -> Arc<dyn MailProvider> {
    match kind {
        connection::ProviderKind::Gmail => Arc::new(GmailProvider::new(http)),
        connection::ProviderKind::Graph => Arc::new(GraphProvider::new(http)),
    }
}

#[async_trait]
impl JobHandler for MailModifyHandler {
    async fn handle(&self, payload: &str) -> anyhow::Result<()> {
        let job: ModifyJob = serde_json::from_str(payload)?;

        let Some(conn_row) = connection::Entity::find_by_id(job.connection_id).one(&self.db).await? else {
            tracing::warn!(connection_id = job.connection_id, "modify job referenced a missing connection");
            return Ok(());
        };

        let provider = provider_for(&conn_row.provider, self.http.clone());
        let mutation: MutationKind = job.mutation.into();
        provider.modify_message(&conn_row.access_token, &job.external_id, mutation).await?;

        let Some(row) = mail_message::Entity::find()
            .filter(mail_message::Column::ConnectionId.eq(job.connection_id))
            .filter(mail_message::Column::ExternalId.eq(&job.external_id))
            .one(&self.db)
            .await?
        else {
            return Ok(());
        };

        let mut model = row.into_active_model();
        match mutation {
            MutationKind::MarkRead => model.is_read = Set(true),
            MutationKind::MarkUnread => model.is_read = Set(false),
            MutationKind::Star => model.is_starred = Set(true),
            MutationKind::Unstar => model.is_starred = Set(false),
            MutationKind::Archive => model.folder = Set("archive".to_string()),
            MutationKind::Trash => model.folder = Set("trash".to_string()),
            MutationKind::Restore => model.folder = Set("inbox".to_string()),
            MutationKind::Delete => {
                mail_message::Entity::delete_by_id(model.id.unwrap()).exec(&self.db).await?;
                return Ok(());
            }
        }
        model.update(&self.db).await?;

        Ok(())
    }
}
