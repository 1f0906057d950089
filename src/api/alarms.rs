use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use super::{not_allowed, ApiJson, ApiQuery, AppState};
use crate::errors::FleetError;
use crate::filters::{AlarmFilter, AlarmListParams};
use crate::ingest::{AlarmIngestor, Ingestion};
use crate::models::alarm::{Alarm, NewAlarm};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/alarms", get(list_alarms).post(create_alarm))
        .route(
            "/alarms/{id}",
            get(get_alarm)
                .put(not_allowed)
                .patch(not_allowed)
                .delete(not_allowed),
        )
}

async fn list_alarms(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<AlarmListParams>,
) -> Result<Json<Vec<Alarm>>, FleetError> {
    let filter = AlarmFilter::from_params(&params, Utc::now())?;
    Ok(Json(state.db.list_alarms(&filter).await?))
}

/// Ingest an alarm, 201 when stored, 208 when already reported
async fn create_alarm(
    State(state): State<AppState>,
    ApiJson(alarm): ApiJson<NewAlarm>,
) -> Result<(StatusCode, Json<Alarm>), FleetError> {
    let ingestor = AlarmIngestor::new(&state.db, state.geocoder.as_ref(), state.enrichment);
    let ingestion = ingestor.ingest(alarm, Utc::now().timestamp()).await?;
    let status = match ingestion {
        Ingestion::Created(_) => StatusCode::CREATED,
        Ingestion::AlreadyReported(_) => StatusCode::ALREADY_REPORTED,
    };
    Ok((status, Json(ingestion.into_alarm())))
}

async fn get_alarm(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Alarm>, FleetError> {
    Ok(Json(state.db.get_alarm(id).await?))
}
