use sea_orm::entity::prelude::*;

/// `(connection_id, external_id)` is unique per user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "mail_message")]
#[sea_orm(
    index(
        name = "idx_mail_message_connection_external",
        unique,
        col = "connection_id",
        col = "external_id"
    )
)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub connection_id: i32,
    pub user_id: i32,
    pub external_id: String,
    pub thread_id: String,
    pub from_addr: String,
    pub to_addr: String,
    pub cc_addr: String,
    pub subject: String,
    pub snippet: String,
    pub labels: Json,
    pub folder: String,
    pub is_read: bool,
    pub is_starred: bool,
    pub has_attachment: bool,
    pub received_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    /// RFC headers relevant to classification (§6), keyed by header name.
    pub classification_headers: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::connection::Entity",
        from = "Column::ConnectionId",
        to = "super::connection::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Connection,
    #[sea_orm(has_one = "super::mail_body_cache::Entity")]
    MailBodyCache,
}

impl Related<super::connection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Connection.def()
    }
}

impl Related<super::mail_body_cache::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MailBodyCache.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
