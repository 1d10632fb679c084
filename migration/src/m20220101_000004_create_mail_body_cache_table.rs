use sea_orm_migration::{prelude::*, schema::*};

use crate::m20220101_000003_create_mail_message_table::MailMessage;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MailBodyCache::Table)
                    .if_not_exists()
                    .col(pk_auto(MailBodyCache::EmailId))
                    .col(text(MailBodyCache::Text))
                    .col(text(MailBodyCache::Html))
                    .col(json(MailBodyCache::Attachments))
                    .col(boolean(MailBodyCache::IsSentinel).default(false))
                    .col(
                        timestamp_with_time_zone(MailBodyCache::CachedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone(MailBodyCache::ExpiresAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mail_body_cache-email_id")
                            .from(MailBodyCache::Table, MailBodyCache::EmailId)
                            .to(MailMessage::Table, MailMessage::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-mail_body_cache-expires_at")
                    .table(MailBodyCache::Table)
                    .col(MailBodyCache::ExpiresAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MailBodyCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum MailBodyCache {
    Table,
    EmailId,
    Text,
    Html,
    Attachments,
    IsSentinel,
    CachedAt,
    ExpiresAt,
}
