//! Auto-labelling side-effect (§4.4): after classification, label-match
//! rules run against sender/domain/subject/body and `embedding_ref` rules,
//! unioning matched labels (score ≥ 0.85) into the result's label set.
use async_trait::async_trait;
use entity::classification_rule::{self, RuleAction, RuleType};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use super::{ClassificationInput, ClassificationResult, RuleUsageSink};

const LABEL_MATCH_THRESHOLD: f64 = 0.85;
const EMBEDDING_REF_SIMILARITY: f64 = 0.90;

#[async_trait]
pub trait EmbeddingLookup: Send + Sync {
    async fn get_embedding(&self, ref_id: &str) -> anyhow::Result<Option<Vec<f32>>>;
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

pub async fn apply(
    db: &DatabaseConnection,
    sink: &dyn RuleUsageSink,
    embeddings: &dyn EmbeddingLookup,
    input: &ClassificationInput,
    result: &mut ClassificationResult,
) -> Result<(), DbErr> {
    let rules = classification_rule::Entity::find()
        .filter(classification_rule::Column::UserId.eq(input.user_id))
        .filter(classification_rule::Column::IsActive.eq(true))
        .filter(classification_rule::Column::Action.eq(RuleAction::AssignLabel))
        .all(db)
        .await?;

    let sender_lower = input.sender.to_lowercase();
    let domain_lower = input.sender_domain.to_lowercase();
    let subject_lower = input.subject.to_lowercase();
    let body_lower = input.body.as_deref().unwrap_or_default().to_lowercase();

    let mut matched_labels = Vec::new();

    for rule in &rules {
        if rule.score < LABEL_MATCH_THRESHOLD {
            continue;
        }

        let matched = match rule.rule_type {
            RuleType::ExactSender => sender_lower == rule.pattern.to_lowercase(),
            RuleType::SenderDomain => domain_lower == rule.pattern.to_lowercase(),
            RuleType::SubjectKeyword => subject_lower.contains(&rule.pattern.to_lowercase()),
            RuleType::BodyKeyword => !body_lower.is_empty() && body_lower.contains(&rule.pattern.to_lowercase()),
            RuleType::EmbeddingRef => {
                if let (Some(pattern_id), Some(embedding)) = (rule.pattern.strip_prefix("ref:"), &input.embedding) {
                    match embeddings.get_embedding(pattern_id).await {
                        Ok(Some(reference)) => cosine_similarity(embedding, &reference) >= EMBEDDING_REF_SIMILARITY,
                        _ => false,
                    }
                } else {
                    false
                }
            }
            RuleType::AiPrompt => false,
        };

        if matched {
            matched_labels.push(rule.value.clone());
            sink.increment_rule_hit(rule.id).await;
        }
    }

    for label in matched_labels {
        if !result.labels.contains(&label) {
            result.labels.push(label);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
