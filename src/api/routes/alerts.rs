use axum::{extract::State, Json};
use serde::Serialize;

use super::state::AppState;
use super::{internal_error, ApiError};
use crate::alerts::{AlertRecord, Alerts, LocationText};
use crate::geocode::Coordinates;

/// Default map view, roughly centered on South Asia
pub const MAP_CENTER: [f64; 2] = [20.0, 78.0];
pub const MAP_ZOOM: u8 = 4;

#[derive(Debug, Serialize)]
pub struct AlertView {
    #[serde(flatten)]
    pub record: AlertRecord,
    pub location_text: String,
}

/// Response structure for the alert history
#[derive(Debug, Serialize)]
pub struct AlertHistoryResponse {
    pub alerts: Vec<AlertView>,
}

/// Response structure for the map
#[derive(Debug, Serialize)]
pub struct AlertMapResponse {
    pub center: [f64; 2],
    pub zoom: u8,
    pub markers: Vec<Coordinates>,
}

/// GET /api/alerts
///
/// Returns every stored alert, oldest first
pub async fn list_alerts(
    State(state): State<AppState>,
) -> Result<Json<AlertHistoryResponse>, ApiError> {
    let records = Alerts::list_all(state.pipeline.db())
        .map_err(|e| internal_error("Failed to load past alerts", e))?;

    let alerts = records
        .into_iter()
        .map(|record| AlertView {
            location_text: LocationText(record.coordinates()).to_string(),
            record,
        })
        .collect();

    Ok(Json(AlertHistoryResponse { alerts }))
}

/// GET /api/alerts/locations
///
/// Returns one marker per located alert
pub async fn get_alert_locations(
    State(state): State<AppState>,
) -> Result<Json<AlertMapResponse>, ApiError> {
    let markers = Alerts::locations(state.pipeline.db())
        .map_err(|e| internal_error("Failed to load alert locations", e))?;

    Ok(Json(AlertMapResponse {
        center: MAP_CENTER,
        zoom: MAP_ZOOM,
        markers,
    }))
}
