//! Stage 1: sender-profile lookup and engagement scoring (§4.4). VIP and
//! muted senders short-circuit; otherwise an importance score computed from
//! engagement maps to a category+priority band. Learned category/labels
//! override the computed result.
use entity::sender_profile;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use super::ClassificationResult;

pub async fn lookup(db: &DatabaseConnection, user_id: i32, sender_email: &str) -> Result<Option<sender_profile::Model>, DbErr> {
    sender_profile::Entity::find()
        .filter(sender_profile::Column::UserId.eq(user_id))
        .filter(sender_profile::Column::Email.eq(sender_email))
        .one(db)
        .await
}

/// Engagement-weighted importance: reply rate dominates, then contact
/// status, then read rate; high delete rate and low read rate at volume
/// are penalized.
fn importance_score(profile: &sender_profile::Model) -> f64 {
    let mut score = profile.reply_rate * 0.55;
    score += if profile.is_contact { 0.20 } else { 0.0 };
    score += profile.read_rate * 0.20;

    if profile.delete_rate > 0.5 {
        score -= 0.25;
    }
    if profile.email_count >= 10 && profile.read_rate < 0.2 {
        score -= 0.15;
    }

    score.clamp(0.0, 1.0)
}

pub fn classify(profile: &sender_profile::Model) -> Option<ClassificationResult> {
    if profile.is_vip {
        return Some(apply_learned(profile, ClassificationResult::candidate("work", Some("urgent"), 0.98, 0.98, "sender_profile", "vip")));
    }
    if profile.is_muted {
        return Some(apply_learned(profile, ClassificationResult::candidate("other", Some("lowest"), 0.02, 0.96, "sender_profile", "muted")));
    }

    let importance = importance_score(profile);
    let (category, sub_category, priority) = match importance {
        s if s >= 0.70 => ("work", "high", s),
        s if s >= 0.50 => ("work", "normal", s),
        s if s >= 0.30 => ("other", "low", s),
        s => ("other", "lowest", s),
    };

    let result = ClassificationResult::candidate(category, Some(sub_category), priority, importance, "sender_profile", "engagement");
    Some(apply_learned(profile, result))
}

fn apply_learned(profile: &sender_profile::Model, mut result: ClassificationResult) -> ClassificationResult {
    if let Some(category) = &profile.learned_category {
        result.category = category.clone();
    }
    if profile.learned_sub_category.is_some() {
        result.sub_category = profile.learned_sub_category.clone();
    }
    if let Ok(labels) = serde_json::from_value::<Vec<String>>(profile.confirmed_labels.clone()) {
        result.labels = labels;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile() -> sender_profile::Model {
        sender_profile::Model {
            id: 1,
            user_id: 1,
            email: "a@b.com".into(),
            domain: "b.com".into(),
            email_count: 20,
            read_rate: 0.9,
            reply_rate: 0.8,
            delete_rate: 0.0,
            first_seen: Utc::now().into(),
            last_seen: Utc::now().into(),
            is_vip: false,
            is_muted: false,
            is_contact: true,
            learned_category: None,
            learned_sub_category: None,
            confirmed_labels: serde_json::json!([]),
        }
    }

    #[test]
    fn vip_short_circuits() {
        let mut p = profile();
        p.is_vip = true;
        let result = classify(&p).unwrap();
        assert_eq!(result.score, 0.98);
        assert_eq!(result.sub_category.as_deref(), Some("urgent"));
    }

    #[test]
    fn muted_short_circuits() {
        let mut p = profile();
        p.is_muted = true;
        let result = classify(&p).unwrap();
        assert_eq!(result.score, 0.96);
    }

    #[test]
    fn high_engagement_maps_to_high_band() {
        let p = profile();
        let result = classify(&p).unwrap();
        assert_eq!(result.sub_category.as_deref(), Some("high"));
    }

    #[test]
    fn learned_category_overrides_computed() {
        let mut p = profile();
        p.learned_category = Some("finance".into());
        let result = classify(&p).unwrap();
        assert_eq!(result.category, "finance");
    }
}
