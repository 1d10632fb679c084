use sea_orm_migration::{prelude::*, schema::*};

use crate::m20220101_000003_create_mail_message_table::MailMessage;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(MailMessage::Table)
                    .add_column(json(MailMessage::ClassificationHeaders).default("{}"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(MailMessage::Table)
                    .drop_column(MailMessage::ClassificationHeaders)
                    .to_owned(),
            )
            .await
    }
}
