//! Per-(user, sender) engagement profile consumed by classification stage 1.
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(
    table_name = "sender_profile",
    index(name = "idx_sender_profile_user_email", unique, col = "user_id", col = "email")
)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub email: String,
    pub domain: String,
    pub email_count: i64,
    pub read_rate: f64,
    pub reply_rate: f64,
    pub delete_rate: f64,
    pub first_seen: DateTimeWithTimeZone,
    pub last_seen: DateTimeWithTimeZone,
    pub is_vip: bool,
    pub is_muted: bool,
    pub is_contact: bool,
    pub learned_category: Option<String>,
    pub learned_sub_category: Option<String>,
    pub confirmed_labels: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
