use axum::{extract::State, Json};
use serde::Serialize;

use super::state::AppState;
use super::{internal_error, ApiError};
use crate::alerts::Alerts;
use crate::feeds::FeedSource;
use crate::schema::CURRENT_SCHEMA_VERSION;

/// Response structure for app information
#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub schema_version: String,
    pub alert_count: i64,
    pub sources: Vec<SourceInfo>,
}

#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub id: FeedSource,
    pub heading: &'static str,
}

/// GET /api/app-info
///
/// Returns application version, the number of stored alerts and the feed
/// sources the dashboard can fetch
pub async fn get_app_info(State(state): State<AppState>) -> Result<Json<AppInfo>, ApiError> {
    let alert_count = Alerts::count(state.pipeline.db())
        .map_err(|e| internal_error("Failed to count alerts", e))?;

    Ok(Json(AppInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: CURRENT_SCHEMA_VERSION.to_string(),
        alert_count,
        sources: FeedSource::ALL
            .iter()
            .map(|&source| SourceInfo {
                id: source,
                heading: source.heading(),
            })
            .collect(),
    }))
}
