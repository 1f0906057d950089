use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::{created, today, ApiJson, AppState};
use crate::errors::FleetError;
use crate::models::license::{License, LicenseRequest};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/licenses", get(list_licenses).post(create_license))
        .route(
            "/licenses/{id}",
            get(get_license).put(update_license).delete(delete_license),
        )
        .route(
            "/users/{uuid}/licenses",
            get(user_licenses).post(create_user_license),
        )
}

async fn list_licenses(State(state): State<AppState>) -> Result<Json<Vec<License>>, FleetError> {
    Ok(Json(state.db.list_licenses(None).await?))
}

async fn create_license(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LicenseRequest>,
) -> Result<(StatusCode, Json<License>), FleetError> {
    request.validate(today())?;
    let driver = request.driver()?;
    Ok(created(state.db.create_license(driver, &request).await?))
}

async fn get_license(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<License>, FleetError> {
    Ok(Json(state.db.get_license(id).await?))
}

async fn update_license(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<LicenseRequest>,
) -> Result<Json<License>, FleetError> {
    request.validate(today())?;
    let driver = request.driver()?;
    Ok(Json(state.db.update_license(id, driver, &request).await?))
}

async fn delete_license(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_license(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn user_licenses(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Vec<License>>, FleetError> {
    Ok(Json(state.db.user_licenses(uuid).await?))
}

/// Register a license for the user in the path
async fn create_user_license(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    ApiJson(request): ApiJson<LicenseRequest>,
) -> Result<(StatusCode, Json<License>), FleetError> {
    request.validate(today())?;
    state.db.get_user(uuid).await?;
    Ok(created(state.db.create_license(uuid, &request).await?))
}
