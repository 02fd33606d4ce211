//! Analysis orchestration: one linear search -> extract -> persist pipeline
//! per request. A failure at any step aborts the request; nothing is written
//! until both upstream calls have succeeded.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::clients::{Extraction, GatewayError, GeminiClient, PerplexityClient, SearchAnswer};
use crate::db::{AnalysisDraft, AnalysisRecord, Store};
use crate::visibility::VisibilityTier;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Upstream(GatewayError),

    #[error("extraction output did not match the expected shape: {0}")]
    ExtractionFormat(String),

    #[error("Analysis {0} not found")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Sends a query to the external search API.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchAnswer, GatewayError>;
}

#[async_trait]
impl SearchGateway for PerplexityClient {
    async fn search(&self, query: &str) -> Result<SearchAnswer, GatewayError> {
        PerplexityClient::search(self, query).await
    }
}

/// Extracts structured visibility facts from a search answer.
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    async fn extract(
        &self,
        query: &str,
        answer_text: &str,
        target: &str,
    ) -> Result<Extraction, GatewayError>;
}

#[async_trait]
impl ExtractionGateway for GeminiClient {
    async fn extract(
        &self,
        query: &str,
        answer_text: &str,
        target: &str,
    ) -> Result<Extraction, GatewayError> {
        GeminiClient::extract(self, query, answer_text, target).await
    }
}

/// What the caller wants done. A regenerate names the row it overwrites, so
/// the insert-vs-update decision is carried by the type instead of a
/// nullable id.
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    New {
        query: String,
        target: String,
    },
    Regenerate {
        id: i32,
        query: String,
        target: String,
    },
}

impl AnalysisRequest {
    fn parts(&self) -> (&str, &str) {
        match self {
            Self::New { query, target } | Self::Regenerate { query, target, .. } => {
                (query, target)
            }
        }
    }
}

#[derive(Clone)]
pub struct AnalysisService {
    search: Arc<dyn SearchGateway>,
    extraction: Arc<dyn ExtractionGateway>,
    store: Store,
}

impl AnalysisService {
    pub fn new(
        search: Arc<dyn SearchGateway>,
        extraction: Arc<dyn ExtractionGateway>,
        store: Store,
    ) -> Self {
        Self {
            search,
            extraction,
            store,
        }
    }

    /// Runs the full pipeline and returns the persisted record. On a
    /// regenerate the row keeps its id; only `completed_at` and the analysis
    /// fields change.
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisRecord, AnalysisError> {
        let (query, target) = request.parts();
        let created_at = Utc::now().to_rfc3339();

        let answer = self
            .search
            .search(query)
            .await
            .map_err(AnalysisError::Upstream)?;

        let extraction = self
            .extraction
            .extract(query, &answer.text, target)
            .await
            .map_err(|e| match e {
                GatewayError::Format { detail, .. } => AnalysisError::ExtractionFormat(detail),
                other => AnalysisError::Upstream(other),
            })?;

        let draft = AnalysisDraft {
            created_at,
            completed_at: Utc::now().to_rfc3339(),
            target: target.to_string(),
            prompt: query.to_string(),
            answer_text: answer.text,
            citations: answer.citations,
            is_visible: extraction.is_visible,
            rank_position: extraction.rank_position,
            competitors: extraction.competitors,
        };

        let record = match &request {
            AnalysisRequest::New { .. } => self.store.insert_analysis(&draft).await?,
            AnalysisRequest::Regenerate { id, .. } => self
                .store
                .update_analysis(*id, &draft)
                .await?
                .ok_or(AnalysisError::NotFound(*id))?,
        };

        let tier = VisibilityTier::classify(record.is_visible, record.rank_position);
        info!(
            "Analysis {} complete: target '{}' rank={:?} -> {}",
            record.id, record.target, record.rank_position, tier.label()
        );

        Ok(record)
    }
}
