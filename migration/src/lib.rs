pub use sea_orm_migration::prelude::*;

mod m20220101_000001_create_table;
mod m20220101_000002_create_connection_table;
mod m20220101_000003_create_mail_message_table;
mod m20220101_000004_create_mail_body_cache_table;
mod m20220101_000006_create_sender_profile_table;
mod m20220101_000007_create_classification_rule_table;
mod m20240930_180024_user_token_usage;
mod m20241015_093000_add_mail_message_headers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20220101_000001_create_table::Migration),
            Box::new(m20220101_000002_create_connection_table::Migration),
            Box::new(m20220101_000003_create_mail_message_table::Migration),
            Box::new(m20220101_000004_create_mail_body_cache_table::Migration),
            Box::new(m20220101_000006_create_sender_profile_table::Migration),
            Box::new(m20220101_000007_create_classification_rule_table::Migration),
            Box::new(m20240930_180024_user_token_usage::Migration),
            Box::new(m20241015_093000_add_mail_message_headers::Migration),
        ]
    }
}
