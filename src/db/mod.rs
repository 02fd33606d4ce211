use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::analysis::{AnalysisDraft, AnalysisRecord};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // SQLite will not create missing parent directories on its own.
        if !db_url.contains(":memory:") {
            let file = Path::new(db_url.trim_start_matches("sqlite:"));
            if let Some(parent) = file.parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !file.exists() {
                std::fs::File::create(file)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database ready, migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn analysis_repo(&self) -> repositories::analysis::AnalysisRepository {
        repositories::analysis::AnalysisRepository::new(self.conn.clone())
    }

    pub async fn find_analysis(&self, id: i32) -> Result<Option<AnalysisRecord>> {
        self.analysis_repo().find_by_id(id).await
    }

    pub async fn insert_analysis(&self, draft: &AnalysisDraft) -> Result<AnalysisRecord> {
        self.analysis_repo().insert(draft).await
    }

    pub async fn update_analysis(
        &self,
        id: i32,
        draft: &AnalysisDraft,
    ) -> Result<Option<AnalysisRecord>> {
        self.analysis_repo().update(id, draft).await
    }

    pub async fn list_analyses(&self) -> Result<Vec<AnalysisRecord>> {
        self.analysis_repo().list_all().await
    }
}
