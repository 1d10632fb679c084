//! Classification-pattern memory (§3, §4.7): vector-indexed nodes backing
//! the classification pipeline's semantic cache and embedding-ref rules.
//! Only written for LLM results with score ≥ `semantic_cache_write_threshold`
//! and only when no existing entry has cosine similarity ≥ the dedup
//! threshold for the same user.
use async_trait::async_trait;
use chrono::Utc;
use neo4rs::{query, Row};
use uuid::Uuid;

use crate::classify::auto_label::EmbeddingLookup;
use crate::classify::semantic_cache::{SemanticCacheEntry, SemanticCacheStore, DEFAULT_TOP_K};
use crate::classify::ClassificationResult;

use super::GraphStore;

fn row_to_entry(row: &Row) -> Option<SemanticCacheEntry> {
    let labels: Vec<String> = row.get::<Vec<String>>("labels").unwrap_or_default();
    Some(SemanticCacheEntry {
        id: row.get("id").ok()?,
        similarity: row.get("score").unwrap_or(0.0),
        usage_count: row.get("usage_count").unwrap_or(0),
        category: row.get("category").ok()?,
        sub_category: row.get("sub_category").ok(),
        priority: row.get("priority").unwrap_or(0.5),
        labels,
    })
}

#[async_trait]
impl SemanticCacheStore for GraphStore {
    async fn query_similar(&self, user_id: i32, embedding: &[f32], min_similarity: f64, top_k: usize) -> anyhow::Result<Vec<SemanticCacheEntry>> {
        // The vector index has no notion of `user_id`, so a plain top-K query
        // can come back entirely filled with another user's nodes. Over-fetch
        // 2x before the WHERE filter narrows it down, then re-truncate here.
        let fetch_n = (top_k * 2).max(1) as i64;
        let mut result = self
            .graph
            .execute(
                query(
                    "CALL db.index.vector.queryNodes('classification_pattern_embedding', $fetch_n, $embedding) \
                     YIELD node, score \
                     WHERE node.user_id = $user_id AND score >= $min_similarity \
                     RETURN node.id AS id, score, node.usage_count AS usage_count, node.category AS category, \
                         node.sub_category AS sub_category, node.priority AS priority, node.labels AS labels \
                     ORDER BY score DESC",
                )
                .param("fetch_n", fetch_n)
                .param("embedding", embedding.iter().map(|v| *v as f64).collect::<Vec<_>>())
                .param("user_id", user_id as i64)
                .param("min_similarity", min_similarity),
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = result.next().await? {
            if let Some(entry) = row_to_entry(&row) {
                entries.push(entry);
            }
        }
        entries.truncate(top_k);
        Ok(entries)
    }

    async fn increment_usage(&self, entry_id: &str) -> anyhow::Result<()> {
        self.graph
            .run(
                query("MATCH (p:ClassificationPattern {id: $id}) SET p.usage_count = coalesce(p.usage_count, 0) + 1")
                    .param("id", entry_id),
            )
            .await?;
        Ok(())
    }

    async fn has_near_duplicate(&self, user_id: i32, embedding: &[f32], min_similarity: f64) -> anyhow::Result<bool> {
        let candidates = self.query_similar(user_id, embedding, min_similarity, DEFAULT_TOP_K).await?;
        Ok(!candidates.is_empty())
    }

    async fn write_entry(&self, user_id: i32, embedding: &[f32], result: &ClassificationResult) -> anyhow::Result<()> {
        let id = Uuid::new_v4().to_string();
        self.graph
            .run(
                query(
                    "CREATE (p:ClassificationPattern {id: $id, user_id: $user_id, embedding: $embedding, \
                     category: $category, sub_category: $sub_category, priority: $priority, labels: $labels, \
                     usage_count: 0, created_at: $created_at})",
                )
                .param("id", id)
                .param("user_id", user_id as i64)
                .param("embedding", embedding.iter().map(|v| *v as f64).collect::<Vec<_>>())
                .param("category", result.category.clone())
                .param("sub_category", result.sub_category.clone())
                .param("priority", result.priority)
                .param("labels", result.labels.clone())
                .param("created_at", Utc::now().to_rfc3339()),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EmbeddingLookup for GraphStore {
    async fn get_embedding(&self, ref_id: &str) -> anyhow::Result<Option<Vec<f32>>> {
        let mut result = self
            .graph
            .execute(query("MATCH (p:ClassificationPattern {id: $id}) RETURN p.embedding AS embedding").param("id", ref_id))
            .await?;

        let Some(row) = result.next().await? else { return Ok(None) };
        let embedding: Vec<f64> = row.get("embedding").unwrap_or_default();
        Ok(Some(embedding.into_iter().map(|v| v as f32).collect()))
    }
}
