use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, serde::Serialize, serde::Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum RuleType {
    #[sea_orm(string_value = "exact_sender")]
    ExactSender,
    #[sea_orm(string_value = "sender_domain")]
    SenderDomain,
    #[sea_orm(string_value = "subject_keyword")]
    SubjectKeyword,
    #[sea_orm(string_value = "body_keyword")]
    BodyKeyword,
    #[sea_orm(string_value = "embedding_ref")]
    EmbeddingRef,
    #[sea_orm(string_value = "ai_prompt")]
    AiPrompt,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, serde::Serialize, serde::Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum RuleAction {
    #[sea_orm(string_value = "assign_category")]
    AssignCategory,
    #[sea_orm(string_value = "assign_priority")]
    AssignPriority,
    #[sea_orm(string_value = "assign_label")]
    AssignLabel,
    #[sea_orm(string_value = "mark_important")]
    MarkImportant,
    #[sea_orm(string_value = "mark_spam")]
    MarkSpam,
}

/// Auto-created rules originate from user labelling feedback
/// (`classify::learning`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classification_rule")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub rule_type: RuleType,
    pub pattern: String,
    pub action: RuleAction,
    pub value: String,
    pub score: f64,
    pub is_active: bool,
    pub hit_count: i64,
    pub auto_created: bool,
    pub created_at: DateTimeWithTimeZone,
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
