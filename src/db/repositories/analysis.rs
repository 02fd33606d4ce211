use crate::entities::{analysis_history, prelude::*};
use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;

/// Repository for analysis record operations
pub struct AnalysisRepository {
    conn: DatabaseConnection,
}

impl AnalysisRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(r: analysis_history::Model) -> AnalysisRecord {
        AnalysisRecord {
            id: r.id,
            created_at: r.created_at,
            completed_at: r.completed_at,
            target: r.targets,
            prompt: r.prompts,
            answer_text: r.answer_text,
            citations: serde_json::from_str(&r.citations).unwrap_or_default(),
            is_visible: r.is_visible,
            rank_position: r.rank_position,
            competitors: serde_json::from_str(&r.competitors).unwrap_or_default(),
        }
    }

    fn draft_to_active(draft: &AnalysisDraft) -> Result<analysis_history::ActiveModel> {
        Ok(analysis_history::ActiveModel {
            created_at: Set(draft.created_at.clone()),
            completed_at: Set(draft.completed_at.clone()),
            targets: Set(draft.target.clone()),
            prompts: Set(draft.prompt.clone()),
            answer_text: Set(draft.answer_text.clone()),
            citations: Set(serde_json::to_string(&draft.citations)?),
            is_visible: Set(draft.is_visible),
            rank_position: Set(draft.rank_position),
            competitors: Set(serde_json::to_string(&draft.competitors)?),
            ..Default::default()
        })
    }

    // ========================================================================
    // Analysis Record Operations
    // ========================================================================

    pub async fn insert(&self, draft: &AnalysisDraft) -> Result<AnalysisRecord> {
        let active_model = Self::draft_to_active(draft)?;

        let res = AnalysisHistory::insert(active_model).exec(&self.conn).await?;
        let id = res.last_insert_id;

        info!("Inserted analysis {} for target '{}'", id, draft.target);

        let row = AnalysisHistory::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("analysis {id} vanished after insert"))?;

        Ok(Self::map_model(row))
    }

    pub async fn update(&self, id: i32, draft: &AnalysisDraft) -> Result<Option<AnalysisRecord>> {
        if AnalysisHistory::find_by_id(id).one(&self.conn).await?.is_none() {
            return Ok(None);
        }

        let mut active_model = Self::draft_to_active(draft)?;
        active_model.id = Set(id);

        let updated = AnalysisHistory::update(active_model).exec(&self.conn).await?;

        info!("Regenerated analysis {} for target '{}'", id, draft.target);
        Ok(Some(Self::map_model(updated)))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<AnalysisRecord>> {
        let result = AnalysisHistory::find_by_id(id).one(&self.conn).await?;
        Ok(result.map(Self::map_model))
    }

    pub async fn list_all(&self) -> Result<Vec<AnalysisRecord>> {
        let rows = AnalysisHistory::find()
            .order_by_desc(analysis_history::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub id: i32,
    pub created_at: String,
    pub completed_at: String,
    pub target: String,
    pub prompt: String,
    pub answer_text: String,
    pub citations: Vec<String>,
    pub is_visible: bool,
    pub rank_position: Option<i32>,
    pub competitors: Vec<String>,
}

/// Everything of a record except the store-assigned id.
#[derive(Debug, Clone)]
pub struct AnalysisDraft {
    pub created_at: String,
    pub completed_at: String,
    pub target: String,
    pub prompt: String,
    pub answer_text: String,
    pub citations: Vec<String>,
    pub is_visible: bool,
    pub rank_position: Option<i32>,
    pub competitors: Vec<String>,
}
