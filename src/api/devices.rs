use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use super::{created, ApiJson, ApiQuery, AppState};
use crate::errors::FleetError;
use crate::models::device::{Device, DeviceListQuery, DeviceRequest, LinkDeviceRequest};
use crate::models::user::User;
use crate::validation::ValidationError;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/devices", get(list_devices).post(upsert_device))
        .route(
            "/devices/{imei}",
            get(get_device).put(update_device).delete(delete_device),
        )
        .route("/devices/{imei}/users", get(device_users))
        .route(
            "/users/{uuid}/devices",
            get(user_devices).post(link_user_device),
        )
}

async fn list_devices(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DeviceListQuery>,
) -> Result<Json<Vec<Device>>, FleetError> {
    Ok(Json(state.db.list_devices(query.tracking_filter()).await?))
}

/// Create a device, or update the one registered with the same IMEI
async fn upsert_device(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DeviceRequest>,
) -> Result<(StatusCode, Json<Device>), FleetError> {
    request.validate()?;
    let (device, inserted) = state.db.upsert_device(&request).await?;
    if inserted {
        info!("Registered device {}", device.imei);
        Ok(created(device))
    } else {
        Ok((StatusCode::OK, Json(device)))
    }
}

async fn get_device(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<Json<Device>, FleetError> {
    Ok(Json(state.db.get_device(&imei).await?))
}

async fn update_device(
    State(state): State<AppState>,
    Path(imei): Path<String>,
    ApiJson(request): ApiJson<DeviceRequest>,
) -> Result<Json<Device>, FleetError> {
    request.validate()?;
    if request.imei.as_str() != imei {
        return Err(ValidationError::field("imei", "does not match the device in the path").into());
    }
    Ok(Json(state.db.update_device(&imei, &request).await?))
}

async fn delete_device(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_device(&imei).await?;
    info!("Deleted device {}", imei);
    Ok(StatusCode::NO_CONTENT)
}

async fn device_users(
    State(state): State<AppState>,
    Path(imei): Path<String>,
) -> Result<Json<Vec<User>>, FleetError> {
    Ok(Json(state.db.device_users(&imei).await?))
}

async fn user_devices(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Vec<Device>>, FleetError> {
    Ok(Json(state.db.user_devices(uuid).await?))
}

async fn link_user_device(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    ApiJson(request): ApiJson<LinkDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), FleetError> {
    Ok(created(state.db.link_user_device(uuid, &request.imei).await?))
}
