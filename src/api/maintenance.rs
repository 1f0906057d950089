use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::{created, ApiJson, ApiQuery, AppState};
use crate::errors::FleetError;
use crate::models::maintenance::{
    MaintenanceManual, MaintenanceManualRequest, MaintenanceOperation,
    MaintenanceOperationRequest, ManualQuery, OperationQuery,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/maintenance/manuals", get(list_manuals).post(create_manual))
        .route(
            "/maintenance/manuals/{id}",
            get(get_manual).put(update_manual).delete(delete_manual),
        )
        .route(
            "/maintenance/operations",
            get(list_operations).post(create_operation),
        )
        .route(
            "/maintenance/operations/{id}",
            get(get_operation)
                .put(update_operation)
                .delete(delete_operation),
        )
}

async fn list_manuals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ManualQuery>,
) -> Result<Json<Vec<MaintenanceManual>>, FleetError> {
    Ok(Json(state.db.list_manuals(query.vehicle).await?))
}

async fn create_manual(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MaintenanceManualRequest>,
) -> Result<(StatusCode, Json<MaintenanceManual>), FleetError> {
    request.validate()?;
    Ok(created(state.db.create_manual(&request).await?))
}

async fn get_manual(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceManual>, FleetError> {
    Ok(Json(state.db.get_manual(id).await?))
}

async fn update_manual(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<MaintenanceManualRequest>,
) -> Result<Json<MaintenanceManual>, FleetError> {
    request.validate()?;
    Ok(Json(state.db.update_manual(id, &request).await?))
}

async fn delete_manual(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_manual(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_operations(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OperationQuery>,
) -> Result<Json<Vec<MaintenanceOperation>>, FleetError> {
    Ok(Json(state.db.list_operations(query.manual).await?))
}

async fn create_operation(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MaintenanceOperationRequest>,
) -> Result<(StatusCode, Json<MaintenanceOperation>), FleetError> {
    request.validate()?;
    Ok(created(state.db.create_operation(&request).await?))
}

async fn get_operation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceOperation>, FleetError> {
    Ok(Json(state.db.get_operation(id).await?))
}

async fn update_operation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<MaintenanceOperationRequest>,
) -> Result<Json<MaintenanceOperation>, FleetError> {
    request.validate()?;
    Ok(Json(state.db.update_operation(id, &request).await?))
}

async fn delete_operation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_operation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
