use serde::{Deserialize, Serialize};

use crate::db::AnalysisRecord;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Wire shape of a persisted analysis. The plural field names (`targets`,
/// `prompts`) are the store's historical column names; they each hold one
/// value.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisRecordDto {
    pub id: i32,
    pub created_at: String,
    pub completed_at: String,
    pub targets: String,
    pub prompts: String,
    pub answer_text: String,
    pub citations: Vec<String>,
    pub is_visible: bool,
    pub rank_position: Option<i32>,
    pub competitors: Vec<String>,
}

impl From<AnalysisRecord> for AnalysisRecordDto {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            completed_at: record.completed_at,
            targets: record.target,
            prompts: record.prompt,
            answer_text: record.answer_text,
            citations: record.citations,
            is_visible: record.is_visible,
            rank_position: record.rank_position,
            competitors: record.competitors,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RunAnalysisRequest {
    /// Present on a regenerate; absent or null on a new submission.
    #[serde(default)]
    pub id: Option<i32>,
    pub query: String,
    #[serde(rename = "targetClient")]
    pub target_client: String,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub database: &'static str,
}
