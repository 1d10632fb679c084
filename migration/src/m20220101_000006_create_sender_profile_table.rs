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
                    .table(SenderProfile::Table)
                    .if_not_exists()
                    .col(pk_auto(SenderProfile::Id))
                    .col(integer(SenderProfile::UserId).not_null())
                    .col(string(SenderProfile::Email))
                    .col(string(SenderProfile::Domain))
                    .col(big_integer(SenderProfile::EmailCount).default(0))
                    .col(double(SenderProfile::ReadRate).default(0.0))
                    .col(double(SenderProfile::ReplyRate).default(0.0))
                    .col(double(SenderProfile::DeleteRate).default(0.0))
                    .col(timestamp_with_time_zone(SenderProfile::FirstSeen))
                    .col(timestamp_with_time_zone(SenderProfile::LastSeen))
                    .col(boolean(SenderProfile::IsVip).default(false))
                    .col(boolean(SenderProfile::IsMuted).default(false))
                    .col(boolean(SenderProfile::IsContact).default(false))
                    .col(string_null(SenderProfile::LearnedCategory))
                    .col(string_null(SenderProfile::LearnedSubCategory))
                    .col(json(SenderProfile::ConfirmedLabels))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sender_profile-user_id")
                            .from(SenderProfile::Table, SenderProfile::UserId)
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
                    .name("idx-sender_profile-user_id-email")
                    .unique()
                    .table(SenderProfile::Table)
                    .col(SenderProfile::UserId)
                    .col(SenderProfile::Email)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SenderProfile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SenderProfile {
    Table,
    Id,
    UserId,
    Email,
    Domain,
    EmailCount,
    ReadRate,
    ReplyRate,
    DeleteRate,
    FirstSeen,
    LastSeen,
    IsVip,
    IsMuted,
    IsContact,
    LearnedCategory,
    LearnedSubCategory,
    ConfirmedLabels,
}
