use axum::{
    Router,
    http::{HeaderName, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::AnalysisService;
use crate::state::SharedState;

mod analyses;
mod assets;
mod error;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn analysis(&self) -> &AnalysisService {
        &self.shared.analysis
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);

    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/analyses", get(analyses::list_analyses))
        .route("/analyses", post(analyses::run_analysis))
        .route("/analyses/{id}", get(analyses::get_analysis))
        .route("/health", get(system::health))
        .with_state(state);

    // The dashboard may be hosted anywhere; the header list matches what its
    // HTTP client sends.
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ]));

    Router::new()
        .nest("/api", api_router)
        .fallback(assets::serve_asset)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}
