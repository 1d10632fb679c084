//! Pattern learning from user action (§4.4). Called only when a user adds a
//! label to an email — never on label removal, which creates no rule.
use std::collections::HashMap;

use chrono::Utc;
use entity::classification_rule::{self, RuleAction, RuleType};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

const DOMAIN_FREQUENCY_THRESHOLD: usize = 3;
const SUBJECT_COOCCURRENCE_THRESHOLD: usize = 2;
const EXACT_SENDER_CONFIDENCE: f64 = 0.95;
const DOMAIN_CONFIDENCE: f64 = 0.88;
const SUBJECT_CONFIDENCE: f64 = 0.85;
const EMBEDDING_REF_CONFIDENCE: f64 = 0.90;
const MIN_PERSIST_CONFIDENCE: f64 = 0.85;

/// One historical email that received the same label, used to evaluate
/// domain frequency and subject-token co-occurrence for the new event.
pub struct LabelHistoryEntry {
    pub sender_domain: String,
    pub subject_tokens: Vec<String>,
}

pub struct LabelEvent {
    pub email_id: i32,
    pub sender: String,
    pub sender_domain: String,
    pub subject_tokens: Vec<String>,
}

pub async fn learn_from_label(
    db: &DatabaseConnection,
    user_id: i32,
    label: &str,
    event: &LabelEvent,
    history: &[LabelHistoryEntry],
    embedding: Option<&[f32]>,
) -> Result<(), DbErr> {
    persist_if_new(db, user_id, RuleType::ExactSender, &event.sender, label, EXACT_SENDER_CONFIDENCE).await?;

    let domain_occurrences = history.iter().filter(|h| h.sender_domain == event.sender_domain).count() + 1;
    if domain_occurrences >= DOMAIN_FREQUENCY_THRESHOLD {
        persist_if_new(db, user_id, RuleType::SenderDomain, &event.sender_domain, label, DOMAIN_CONFIDENCE).await?;
    }

    let mut token_counts: HashMap<&str, usize> = HashMap::new();
    for token in event.subject_tokens.iter().chain(history.iter().flat_map(|h| h.subject_tokens.iter())) {
        *token_counts.entry(token.as_str()).or_insert(0) += 1;
    }
    for token in &event.subject_tokens {
        if token_counts.get(token.as_str()).copied().unwrap_or(0) >= SUBJECT_COOCCURRENCE_THRESHOLD {
            persist_if_new(db, user_id, RuleType::SubjectKeyword, token, label, SUBJECT_CONFIDENCE).await?;
        }
    }

    if let Some(_embedding) = embedding {
        let pattern = format!("ref:{}", event.email_id);
        persist_if_new(db, user_id, RuleType::EmbeddingRef, &pattern, label, EMBEDDING_REF_CONFIDENCE).await?;
    }

    Ok(())
}

async fn persist_if_new(
    db: &DatabaseConnection,
    user_id: i32,
    rule_type: RuleType,
    pattern: &str,
    label: &str,
    confidence: f64,
) -> Result<(), DbErr> {
    if confidence < MIN_PERSIST_CONFIDENCE {
        return Ok(());
    }

    let existing = classification_rule::Entity::find()
        .filter(classification_rule::Column::UserId.eq(user_id))
        .filter(classification_rule::Column::RuleType.eq(rule_type.clone()))
        .filter(classification_rule::Column::Pattern.eq(pattern))
        .filter(classification_rule::Column::Action.eq(RuleAction::AssignLabel))
        .filter(classification_rule::Column::Value.eq(label))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let model = classification_rule::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        user_id: Set(user_id),
        rule_type: Set(rule_type),
        pattern: Set(pattern.to_string()),
        action: Set(RuleAction::AssignLabel),
        value: Set(label.to_string()),
        score: Set(confidence),
        is_active: Set(true),
        hit_count: Set(0),
        auto_created: Set(true),
        created_at: Set(Utc::now().into()),
    };
    model.insert(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_confidence_never_persists() {
        assert!(MIN_PERSIST_CONFIDENCE <= SUBJECT_CONFIDENCE);
        assert!(MIN_PERSIST_CONFIDENCE <= DOMAIN_CONFIDENCE);
        assert!(MIN_PERSIST_CONFIDENCE <= EXACT_SENDER_CONFIDENCE);
        assert!(MIN_PERSIST_CONFIDENCE <= EMBEDDING_REF_CONFIDENCE);
    }
}
