use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "analysis_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub created_at: String, // SQLite doesn't strictly enforce types, but typically strings for ISO8601
    pub completed_at: String,
    pub targets: String,
    #[sea_orm(column_type = "Text")]
    pub prompts: String,
    #[sea_orm(column_type = "Text")]
    pub answer_text: String,
    /// JSON array of citation URLs, search-engine order preserved.
    #[sea_orm(column_type = "Text")]
    pub citations: String,
    pub is_visible: bool,
    pub rank_position: Option<i32>,
    /// JSON array of competitor names, unfiltered.
    #[sea_orm(column_type = "Text")]
    pub competitors: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
