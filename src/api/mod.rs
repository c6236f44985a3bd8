pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::analytics::DatasetOverview;
use crate::ml::Pipeline;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub overview: Arc<DatasetOverview>,
    pub started_at: Instant,
    pub prometheus_enabled: bool,
}

impl AppState {
    pub fn new(pipeline: Pipeline, overview: DatasetOverview) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            overview: Arc::new(overview),
            started_at: Instant::now(),
            prometheus_enabled: true,
        }
    }

    pub fn with_prometheus(mut self, enabled: bool) -> Self {
        self.prometheus_enabled = enabled;
        self
    }
}
