use async_trait::async_trait;
use entity::classification_rule;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel};

use crate::classify::RuleUsageSink;

pub struct DbRuleUsageSink {
    pub db: DatabaseConnection,
}

#[async_trait]
impl RuleUsageSink for DbRuleUsageSink {
    async fn increment_rule_hit(&self, rule_id: i32) {
        let Ok(Some(rule)) = classification_rule::Entity::find_by_id(rule_id).one(&self.db).await else {
            return;
        };
        let hit_count = rule.hit_count;
        let mut model = rule.into_active_model();
        model.hit_count = sea_orm::ActiveValue::Set(hit_count + 1);
        if let Err(err) = model.update(&self.db).await {
            tracing::warn!(rule_id, ?err, "failed to increment rule hit count");
        }
    }
}
