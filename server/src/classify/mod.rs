//! Eight-stage classification pipeline (§4.4). Each stage returns its best
//! candidate; the pipeline keeps the highest-scoring result seen so far and
//! early-exits the moment a stage clears `early_exit_threshold`.
pub mod auto_label;
pub mod domain;
pub mod learning;
pub mod llm;
pub mod quota;
pub mod rfc_headers;
pub mod rules;
pub mod semantic_cache;
pub mod sender_profile;
pub mod subject;

use std::{collections::HashMap, time::Instant};

use async_trait::async_trait;
use entity::sender_profile;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::config::cfg;

pub use semantic_cache::SemanticCacheStore;

#[derive(Debug, Clone)]
pub struct ClassificationInput {
    pub user_id: i32,
    pub email_id: i32,
    pub sender: String,
    pub sender_domain: String,
    pub subject: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub category: String,
    pub sub_category: Option<String>,
    pub priority: f64,
    pub labels: Vec<String>,
    pub score: f64,
    pub stage: String,
    pub source: String,
    pub signals: Vec<String>,
    pub llm_used: bool,
    pub processing_time_ms: u64,
}

impl ClassificationResult {
    fn candidate(category: impl Into<String>, sub_category: Option<&str>, priority: f64, score: f64, stage: &str, source: &str) -> Self {
        Self {
            category: category.into(),
            sub_category: sub_category.map(String::from),
            priority,
            labels: vec![],
            score,
            stage: stage.to_string(),
            source: source.to_string(),
            signals: vec![],
            llm_used: false,
            processing_time_ms: 0,
        }
    }

    fn default_result() -> Self {
        Self::candidate("other", Some("normal"), 0.50, 0.50, "default", "default")
    }
}

/// The fixed enumerations stages 0b/0c/1 draw categories and per-category
/// priority adjustments from (§4.4 stage 0b).
pub const CATEGORY_BONUS: &[(&str, f64)] = &[
    ("finance", 0.15),
    ("work", 0.10),
    ("travel", 0.08),
    ("shopping", 0.05),
    ("social", 0.02),
    ("newsletter", 0.0),
    ("marketing", -0.05),
    ("spam", -0.10),
];

pub fn category_bonus(category: &str) -> f64 {
    CATEGORY_BONUS.iter().find(|(c, _)| *c == category).map(|(_, b)| *b).unwrap_or(0.0)
}

#[async_trait]
pub trait RuleUsageSink: Send + Sync {
    async fn increment_rule_hit(&self, rule_id: i32);
}

pub struct Pipeline<'a> {
    pub db: &'a DatabaseConnection,
    pub semantic_cache: &'a dyn SemanticCacheStore,
    pub llm: &'a dyn llm::LlmClassifier,
    pub rule_sink: &'a dyn RuleUsageSink,
}

impl<'a> Pipeline<'a> {
    /// Runs the full §4.4 pipeline: headers, domain, subject, sender
    /// profile, user rules, semantic cache, then the LLM fallback, keeping
    /// the best candidate across stages and early-exiting on a clear win.
    pub async fn classify(&self, input: &ClassificationInput) -> ClassificationResult {
        let started = Instant::now();
        let threshold = cfg.classification.early_exit_threshold;
        let mut best: Option<ClassificationResult> = None;

        macro_rules! consider {
            ($candidate:expr) => {
                if let Some(candidate) = $candidate {
                    let is_winner = candidate.score >= threshold;
                    let should_replace = best.as_ref().map(|b| candidate.score > b.score).unwrap_or(true);
                    if should_replace {
                        best = Some(candidate);
                    }
                    if is_winner {
                        let mut result = best.take().unwrap();
                        result.processing_time_ms = started.elapsed().as_millis() as u64;
                        return result;
                    }
                }
            };
        }

        consider!(rfc_headers::classify(&input.headers));
        consider!(domain::classify(&input.sender_domain));
        consider!(subject::classify(&input.subject));

        if let Ok(Some(profile)) = sender_profile::lookup(self.db, input.user_id, &input.sender).await {
            consider!(sender_profile::classify(&profile));
        }

        if let Ok(Some(result)) = rules::evaluate(self.db, self.rule_sink, input).await {
            consider!(Some(result));
        }

        if let Some(embedding) = &input.embedding {
            if let Ok(Some(result)) = semantic_cache::query(self.semantic_cache, input.user_id, embedding).await {
                consider!(Some(result));
            }
        }

        let current_best_score = best.as_ref().map(|b| b.score).unwrap_or(0.0);
        if current_best_score < cfg.classification.llm_fallback_threshold {
            if quota::has_quota(self.db, input.user_id).await {
                let result = llm::classify(self.llm, self.semantic_cache, input).await;
                let estimated_tokens = (input.subject.len() + input.body.as_deref().map(str::len).unwrap_or(0)) as i64 / 4;
                quota::record_usage(self.db, input.user_id, estimated_tokens.max(1)).await;
                consider!(Some(result));
            } else {
                tracing::warn!(user_id = input.user_id, "daily LLM quota exhausted, skipping fallback stage");
            }
        }

        let mut result = best.unwrap_or_else(ClassificationResult::default_result);
        result.processing_time_ms = started.elapsed().as_millis() as u64;
        result
    }
}

pub type SenderProfileModel = sender_profile::Model;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_bonus_matches_table() {
        assert_eq!(category_bonus("finance"), 0.15);
        assert_eq!(category_bonus("spam"), -0.10);
        assert_eq!(category_bonus("unknown"), 0.0);
    }

    #[test]
    fn default_result_is_neutral() {
        let result = ClassificationResult::default_result();
        assert_eq!(result.category, "other");
        assert_eq!(result.score, 0.50);
        assert_eq!(result.source, "default");
    }
}
