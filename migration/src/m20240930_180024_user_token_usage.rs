use sea_orm_migration::{prelude::*, schema::*};

use crate::m20220101_000001_create_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

const IDX_TOKEN_USAGE_STATS_USER_ID: &str = "idx-user_token_usage_stats-user_id";
const IDX_TOKEN_USAGE_STATS_DATE_USER_ID: &str = "idx-user_token_usage_stats-date-user_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserTokenUsageStats::Table)
                    .if_not_exists()
                    .col(pk_auto(UserTokenUsageStats::Id))
                    .col(
                        date(UserTokenUsageStats::Date)
                            .default(Expr::current_date())
                            .not_null(),
                    )
                    .col(
                        big_integer(UserTokenUsageStats::TokensConsumed)
                            .default(0)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(UserTokenUsageStats::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .col(integer(UserTokenUsageStats::UserId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_token_usage_stats-user_id")
                            .from(UserTokenUsageStats::Table, UserTokenUsageStats::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_TOKEN_USAGE_STATS_USER_ID)
                    .table(UserTokenUsageStats::Table)
                    .col(UserTokenUsageStats::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_TOKEN_USAGE_STATS_DATE_USER_ID)
                    .table(UserTokenUsageStats::Table)
                    .col(UserTokenUsageStats::Date)
                    .col(UserTokenUsageStats::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserTokenUsageStats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserTokenUsageStats {
    Table,
    Id,
    UserId,
    Date,
    TokensConsumed,
    CreatedAt,
}
