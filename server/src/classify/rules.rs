//! Stage 2: user classification rules (§4.4), generalizing the teacher's
//! flat `email/rules.rs` (`UserEmailRules`, `DEFAULT_EMAIL_RULES`) into the
//! full `ClassificationRule` entity: typed rule kinds, hit counts, and an
//! auto-created flag. `ai_prompt` rules are reserved for a future stage and
//! are never evaluated here.
use entity::classification_rule::{self, RuleAction, RuleType};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use super::{ClassificationInput, ClassificationResult, RuleUsageSink};

const MARK_IMPORTANT_PRIORITY: f64 = 0.90;
const MARK_SPAM_PRIORITY: f64 = 0.10;

pub async fn evaluate(
    db: &DatabaseConnection,
    sink: &dyn RuleUsageSink,
    input: &ClassificationInput,
) -> Result<Option<ClassificationResult>, DbErr> {
    let rules = classification_rule::Entity::find()
        .filter(classification_rule::Column::UserId.eq(input.user_id))
        .filter(classification_rule::Column::IsActive.eq(true))
        .all(db)
        .await?;

    let sender_lower = input.sender.to_lowercase();
    let domain_lower = input.sender_domain.to_lowercase();
    let subject_lower = input.subject.to_lowercase();
    let body_lower = input.body.as_deref().unwrap_or_default().to_lowercase();

    // priority order: exact sender, sender domain, subject keyword, body keyword
    for rule_type in [RuleType::ExactSender, RuleType::SenderDomain, RuleType::SubjectKeyword, RuleType::BodyKeyword] {
        for rule in rules.iter().filter(|r| r.rule_type == rule_type) {
            let matched = match rule_type {
                RuleType::ExactSender => sender_lower == rule.pattern.to_lowercase(),
                RuleType::SenderDomain => domain_lower == rule.pattern.to_lowercase() || domain_lower.ends_with(&format!(".{}", rule.pattern.to_lowercase())),
                RuleType::SubjectKeyword => subject_lower.contains(&rule.pattern.to_lowercase()),
                RuleType::BodyKeyword => !body_lower.is_empty() && body_lower.contains(&rule.pattern.to_lowercase()),
                RuleType::EmbeddingRef | RuleType::AiPrompt => false,
            };

            if !matched {
                continue;
            }

            // `assign_label` is handled entirely by `auto_label`'s label-union
            // side effect, not by this category/priority-resolving stage.
            let Some(candidate) = candidate_for_action(rule, rule_type) else {
                continue;
            };

            sink.increment_rule_hit(rule.id).await;
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

fn candidate_for_action(rule: &classification_rule::Model, rule_type: RuleType) -> Option<ClassificationResult> {
    let score = match rule_type {
        RuleType::ExactSender => 0.99,
        RuleType::SenderDomain => 0.95,
        RuleType::SubjectKeyword => 0.90,
        RuleType::BodyKeyword => 0.85,
        RuleType::EmbeddingRef | RuleType::AiPrompt => 0.0,
    };
    let source = rule_type_label(&rule_type);

    match rule.action {
        RuleAction::AssignCategory => Some(ClassificationResult::candidate(rule.value.clone(), None, rule.score, score, "rules", source)),
        RuleAction::AssignPriority => {
            let priority = rule.value.parse::<f64>().unwrap_or(rule.score).clamp(0.0, 1.0);
            Some(ClassificationResult::candidate("other", None, priority, score, "rules", source))
        }
        RuleAction::MarkImportant => {
            let mut result = ClassificationResult::candidate("other", None, MARK_IMPORTANT_PRIORITY, score, "rules", source);
            result.labels.push("important".to_string());
            Some(result)
        }
        RuleAction::MarkSpam => Some(ClassificationResult::candidate("spam", None, MARK_SPAM_PRIORITY, score, "rules", source)),
        RuleAction::AssignLabel => None,
    }
}

fn rule_type_label(rule_type: &RuleType) -> &'static str {
    match rule_type {
        RuleType::ExactSender => "exact_sender",
        RuleType::SenderDomain => "sender_domain",
        RuleType::SubjectKeyword => "subject_keyword",
        RuleType::BodyKeyword => "body_keyword",
        RuleType::EmbeddingRef => "embedding_ref",
        RuleType::AiPrompt => "ai_prompt",
    }
}
