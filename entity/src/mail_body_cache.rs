//! Tier-2 warm document store backing the cache core. Only populated for
//! messages newer than the retention horizon; `is_sentinel` marks a
//! provider-confirmed empty body so repeat lookups don't refetch.
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "mail_body_cache")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub email_id: i32,
    pub text: String,
    pub html: String,
    pub attachments: Json,
    pub is_sentinel: bool,
    pub cached_at: DateTimeWithTimeZone,
    pub expires_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mail_message::Entity",
        from = "Column::EmailId",
        to = "super::mail_message::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    MailMessage,
}

impl Related<super::mail_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MailMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
