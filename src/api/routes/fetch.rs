use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use log::error;

use super::state::AppState;
use super::{api_error, ApiError};
use crate::analysis::FetchReport;
use crate::error::HazardPulseError;
use crate::feeds::FeedSource;

/// POST /api/fetch/{source}
///
/// Fetches the latest entries of one feed, stores the ones flagged as
/// disaster alerts, and returns them
pub async fn fetch_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Json<FetchReport>, ApiError> {
    let source: FeedSource = source
        .parse()
        .map_err(|e: HazardPulseError| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let report = state
        .pipeline
        .fetch_and_analyze(source)
        .await
        .map_err(|e| {
            error!("Fetching {} failed: {}", source, e);
            match e {
                HazardPulseError::HttpError(_) | HazardPulseError::FeedError(_) => api_error(
                    StatusCode::BAD_GATEWAY,
                    format!("Could not fetch the {} feed: {}", source, e),
                ),
                _ => api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to process the {} feed", source),
                ),
            }
        })?;

    Ok(Json(report))
}
