use sea_orm_migration::{prelude::*, schema::*};

use crate::m20220101_000001_create_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClassificationRule::Table)
                    .if_not_exists()
                    .col(pk_auto(ClassificationRule::Id))
                    .col(integer(ClassificationRule::UserId).not_null())
                    .col(string(ClassificationRule::RuleType))
                    .col(string(ClassificationRule::Pattern))
                    .col(string(ClassificationRule::Action))
                    .col(string(ClassificationRule::Value))
                    .col(double(ClassificationRule::Score))
                    .col(boolean(ClassificationRule::IsActive).default(true))
                    .col(big_integer(ClassificationRule::HitCount).default(0))
                    .col(boolean(ClassificationRule::AutoCreated).default(false))
                    .col(
                        timestamp_with_time_zone(ClassificationRule::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-classification_rule-user_id")
                            .from(ClassificationRule::Table, ClassificationRule::UserId)
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
                    .name("idx-classification_rule-user_id-type-pattern")
                    .unique()
                    .table(ClassificationRule::Table)
                    .col(ClassificationRule::UserId)
                    .col(ClassificationRule::RuleType)
                    .col(ClassificationRule::Pattern)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClassificationRule::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ClassificationRule {
    Table,
    Id,
    UserId,
    RuleType,
    Pattern,
    Action,
    Value,
    Score,
    IsActive,
    HitCount,
    AutoCreated,
    CreatedAt,
}
