//! Per-user daily LLM token quota, generalizing the teacher's
//! `UserTokenUsageStatsCtrl` tally
//! (`email_processor.rs::add_tally_to_user_daily_quota`) into a gate on the
//! classification pipeline's LLM fallback stage.
use chrono::Utc;
use entity::user_token_usage;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::config::cfg;

/// Returns `true` when the user has room left in today's quota.
pub async fn has_quota(db: &DatabaseConnection, user_id: i32) -> bool {
    match tokens_used_today(db, user_id).await {
        Ok(used) => used < cfg.api.token_limits.daily_user_quota,
        Err(err) => {
            tracing::warn!(?err, user_id, "failed to read token usage, allowing the LLM call");
            true
        }
    }
}

async fn tokens_used_today(db: &DatabaseConnection, user_id: i32) -> Result<i64, sea_orm::DbErr> {
    let today = Utc::now().date_naive();
    let row = user_token_usage::Entity::find()
        .filter(user_token_usage::Column::UserId.eq(user_id))
        .filter(user_token_usage::Column::Date.eq(today))
        .one(db)
        .await?;
    Ok(row.map(|row| row.tokens_consumed).unwrap_or(0))
}

/// Tallies an LLM call's token cost onto today's row, creating it on first use.
pub async fn record_usage(db: &DatabaseConnection, user_id: i32, tokens: i64) {
    let today = Utc::now().date_naive();
    let existing = user_token_usage::Entity::find()
        .filter(user_token_usage::Column::UserId.eq(user_id))
        .filter(user_token_usage::Column::Date.eq(today))
        .one(db)
        .await;

    let result = match existing {
        Ok(Some(row)) => {
            let tokens_consumed = row.tokens_consumed + tokens;
            let mut model: user_token_usage::ActiveModel = row.into();
            model.tokens_consumed = Set(tokens_consumed);
            model.update(db).await.map(|_| ())
        }
        Ok(None) => {
            let model = user_token_usage::ActiveModel {
                user_id: Set(user_id),
                date: Set(today),
                tokens_consumed: Set(tokens),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            };
            model.insert(db).await.map(|_| ())
        }
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        tracing::warn!(?err, user_id, "failed to record token usage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_field_is_wired_to_config() {
        assert!(cfg.api.token_limits.daily_user_quota >= 0);
    }
}
