//! `ai:classify` handler: runs the classification pipeline against a stored
//! message, persists the result onto the row, applies auto-labelling, and
//! emits a `classification.updated` real-time event.
use async_trait::async_trait;
use entity::mail_message;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel};
use serde::Deserialize;

use crate::classify::{auto_label, ClassificationInput, Pipeline, SemanticCacheStore};
use crate::job::handlers::rule_sink::DbRuleUsageSink;
use crate::job::JobHandler;
use crate::realtime::SharedRealtimeBus;

#[derive(Debug, Deserialize)]
struct ClassifyJob {
    user_id: i32,
    email_id: i32,
}

pub struct ClassifyHandler {
    pub db: DatabaseConnection,
    pub semantic_cache: std::sync::Arc<dyn SemanticCacheStore>,
    pub embeddings: std::sync::Arc<dyn auto_label::EmbeddingLookup>,
    pub llm: std::sync::Arc<dyn crate::classify::llm::LlmClassifier>,
    pub realtime: SharedRealtimeBus,
}

#[async_trait]
impl JobHandler for ClassifyHandler {
    async fn handle(&self, payload: &str) -> anyhow::Result<()> {
        let job: ClassifyJob = serde_json::from_str(payload)?;

        let Some(row) = mail_message::Entity::find_by_id(job.email_id).one(&self.db).await? else {
            tracing::warn!(email_id = job.email_id, "classify job referenced a message that no longer exists");
            return Ok(());
        };

        let domain = row.from_addr.rsplit('@').next().unwrap_or_default().to_lowercase();
        let headers = serde_json::from_value(row.classification_headers.clone()).unwrap_or_default();
        let input = ClassificationInput {
            user_id: job.user_id,
            email_id: job.email_id,
            sender: row.from_addr.clone(),
            sender_domain: domain,
            subject: row.subject.clone(),
            headers,
            body: None,
            embedding: None,
        };

        let rule_sink: DbRuleUsageSink = DbRuleUsageSink { db: self.db.clone() };
        let pipeline = Pipeline { db: &self.db, semantic_cache: self.semantic_cache.as_ref(), llm: self.llm.as_ref(), rule_sink: &rule_sink };

        let mut result = pipeline.classify(&input).await;
        auto_label::apply(&self.db, &rule_sink, self.embeddings.as_ref(), &input, &mut result).await.ok();

        let labels = serde_json::to_value(&result.labels)?;
        let mut model = row.into_active_model();
        model.labels = sea_orm::ActiveValue::Set(labels);
        model.update(&self.db).await?;

        self.realtime
            .push(
                job.user_id,
                "classification.updated",
                serde_json::json!({
                    "email_id": job.email_id,
                    "category": result.category,
                    "sub_category": result.sub_category,
                    "priority": result.priority,
                    "labels": result.labels,
                }),
            )
            .await;

        Ok(())
    }
}
