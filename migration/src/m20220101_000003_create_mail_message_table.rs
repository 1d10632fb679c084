use sea_orm_migration::{prelude::*, schema::*};

use crate::{m20220101_000001_create_table::User, m20220101_000002_create_connection_table::Connection};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MailMessage::Table)
                    .if_not_exists()
                    .col(pk_auto(MailMessage::Id))
                    .col(integer(MailMessage::ConnectionId).not_null())
                    .col(integer(MailMessage::UserId).not_null())
                    .col(string(MailMessage::ExternalId))
                    .col(string(MailMessage::ThreadId))
                    .col(string(MailMessage::FromAddr))
                    .col(string(MailMessage::ToAddr))
                    .col(string(MailMessage::CcAddr))
                    .col(string(MailMessage::Subject))
                    .col(string(MailMessage::Snippet))
                    .col(json(MailMessage::Labels))
                    .col(string(MailMessage::Folder))
                    .col(boolean(MailMessage::IsRead).default(false))
                    .col(boolean(MailMessage::IsStarred).default(false))
                    .col(boolean(MailMessage::HasAttachment).default(false))
                    .col(timestamp_with_time_zone(MailMessage::ReceivedAt))
                    .col(
                        timestamp_with_time_zone(MailMessage::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mail_message-connection_id")
                            .from(MailMessage::Table, MailMessage::ConnectionId)
                            .to(Connection::Table, Connection::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mail_message-user_id")
                            .from(MailMessage::Table, MailMessage::UserId)
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
                    .name("idx-mail_message-connection_id-external_id")
                    .unique()
                    .table(MailMessage::Table)
                    .col(MailMessage::ConnectionId)
                    .col(MailMessage::ExternalId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-mail_message-user_id-received_at")
                    .table(MailMessage::Table)
                    .col(MailMessage::UserId)
                    .col(MailMessage::ReceivedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MailMessage::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum MailMessage {
    Table,
    Id,
    ConnectionId,
    UserId,
    ExternalId,
    ThreadId,
    FromAddr,
    ToAddr,
    CcAddr,
    Subject,
    Snippet,
    Labels,
    Folder,
    IsRead,
    IsStarred,
    HasAttachment,
    ReceivedAt,
    CreatedAt,
    ClassificationHeaders,
}
