use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::connection::Entity")]
    Connection,
    #[sea_orm(has_many = "super::sender_profile::Entity")]
    SenderProfile,
    #[sea_orm(has_many = "super::classification_rule::Entity")]
    ClassificationRule,
}

impl Related<super::connection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Connection.def()
    }
}

impl Related<super::sender_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SenderProfile.def()
    }
}

impl Related<super::classification_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassificationRule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
