use std::sync::Arc;

use crate::clients::{GeminiClient, PerplexityClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::AnalysisService;

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across both gateways to enable connection pooling.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("aisov/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Everything the request handlers share. Built once at startup from the
/// config; read-only afterwards, so no locking is needed.
#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub analysis: AnalysisService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client =
            build_shared_http_client(config.perplexity.request_timeout_seconds)?;

        let perplexity = Arc::new(PerplexityClient::with_shared_client(
            http_client.clone(),
            &config.perplexity,
        ));
        let gemini = Arc::new(GeminiClient::with_shared_client(
            http_client,
            &config.gemini,
        ));

        let analysis = AnalysisService::new(perplexity, gemini, store.clone());

        Ok(Self {
            config,
            store,
            analysis,
        })
    }
}
