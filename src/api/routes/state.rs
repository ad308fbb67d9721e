use std::sync::Arc;

use crate::analysis::AlertPipeline;

/// Shared application state passed to all Axum handlers via `.with_state()`.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AlertPipeline>,
}

impl AppState {
    pub fn new(pipeline: AlertPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
