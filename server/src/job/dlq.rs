//! DLQ record shape and write path (§3, §6): append-only, no reclaim (§9 open
//! question — the source offers no reclaim tool, so neither do we).
use std::collections::HashMap;

use chrono::Utc;

use crate::{error::AppError, stream::{backend::StreamEntry, topics::dlq_topic, StreamBackend}};

pub async fn escalate_to_dlq(
    backend: &dyn StreamBackend,
    topic: &str,
    group: &str,
    consumer: &str,
    entry: &StreamEntry,
) -> Result<(), AppError> {
    let dlq = dlq_topic(topic);
    let mut fields: HashMap<String, String> = HashMap::new();
    fields.insert("original_stream".to_string(), topic.to_string());
    fields.insert("original_id".to_string(), entry.id.clone());
    fields.insert("failed_at".to_string(), Utc::now().to_rfc3339());
    fields.insert("consumer".to_string(), consumer.to_string());
    fields.insert("group".to_string(), group.to_string());
    for (k, v) in &entry.fields {
        fields.insert(format!("original_{k}"), v.clone());
    }

    let payload = serde_json::to_string(&fields)
        .map_err(|e| AppError::Stream(format!("failed to encode DLQ record: {e}")))?;
    backend.publish(&dlq, &payload).await?;
    tracing::warn!(topic, id = %entry.id, "entry escalated to DLQ after exhausting retries");
    Ok(())
}
