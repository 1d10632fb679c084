//! Stage 3: semantic cache lookup (§4.4). Defined against a trait instead
//! of a concrete store so the classification pipeline depends on a
//! capability, not on the personalization graph's storage details — the
//! same "interface-based polymorphism" shape the provider adapters use.
use async_trait::async_trait;

use super::ClassificationResult;

#[derive(Debug, Clone)]
pub struct SemanticCacheEntry {
    pub id: String,
    pub similarity: f64,
    pub usage_count: i64,
    pub category: String,
    pub sub_category: Option<String>,
    pub priority: f64,
    pub labels: Vec<String>,
}

/// Default number of candidates `query()` asks for; implementations
/// over-fetch from their index by 2x this before filtering by `user_id`.
pub const DEFAULT_TOP_K: usize = 5;

#[async_trait]
pub trait SemanticCacheStore: Send + Sync {
    /// Up to `top_k` candidates with cosine similarity ≥ `min_similarity`,
    /// filtered by `user_id` and sorted by score descending.
    async fn query_similar(&self, user_id: i32, embedding: &[f32], min_similarity: f64, top_k: usize) -> anyhow::Result<Vec<SemanticCacheEntry>>;

    async fn increment_usage(&self, entry_id: &str) -> anyhow::Result<()>;

    async fn has_near_duplicate(&self, user_id: i32, embedding: &[f32], min_similarity: f64) -> anyhow::Result<bool>;

    async fn write_entry(&self, user_id: i32, embedding: &[f32], result: &ClassificationResult) -> anyhow::Result<()>;
}

/// Selects the candidate maximising `similarity * log2(usage_count + 1)`.
pub async fn query(store: &dyn SemanticCacheStore, user_id: i32, embedding: &[f32]) -> anyhow::Result<Option<ClassificationResult>> {
    let threshold = crate::config::cfg.classification.semantic_cache_query_similarity;
    let candidates = store.query_similar(user_id, embedding, threshold, DEFAULT_TOP_K).await?;

    let best = candidates
        .into_iter()
        .max_by(|a, b| ranking_score(a).partial_cmp(&ranking_score(b)).unwrap_or(std::cmp::Ordering::Equal));

    let Some(best) = best else { return Ok(None) };
    store.increment_usage(&best.id).await?;

    Ok(Some(ClassificationResult {
        category: best.category,
        sub_category: best.sub_category,
        priority: best.priority,
        labels: best.labels,
        score: best.similarity,
        stage: "semantic_cache".into(),
        source: best.id,
        signals: vec![],
        llm_used: false,
        processing_time_ms: 0,
    }))
}

fn ranking_score(entry: &SemanticCacheEntry) -> f64 {
    entry.similarity * (entry.usage_count as f64 + 1.0).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(similarity: f64, usage_count: i64) -> SemanticCacheEntry {
        SemanticCacheEntry {
            id: format!("{similarity}-{usage_count}"),
            similarity,
            usage_count,
            category: "other".into(),
            sub_category: None,
            priority: 0.5,
            labels: vec![],
        }
    }

    #[test]
    fn ranking_prefers_high_usage_over_marginal_similarity() {
        let low_sim_high_usage = entry(0.93, 50);
        let high_sim_no_usage = entry(0.99, 0);
        assert!(ranking_score(&low_sim_high_usage) > ranking_score(&high_sim_no_usage));
    }
}
