//! Shared application state.

use std::sync::Arc;

use medsift_analyze::AnalysisPipeline;
use medsift_core::MedsiftConfig;
use medsift_runtime::AnalysisScheduler;
use medsift_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: MedsiftConfig,
    pub store: Arc<SqliteStore>,
    pub scheduler: AnalysisScheduler,
}

impl AppState {
    pub fn new(config: MedsiftConfig, store: Arc<SqliteStore>) -> Self {
        let pipeline = Arc::new(AnalysisPipeline::new(store.clone(), config.analysis.clone()));
        let scheduler = AnalysisScheduler::new(pipeline, config.analysis.interval_secs);
        Self {
            config,
            store,
            scheduler,
        }
    }
}
