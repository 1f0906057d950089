use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use super::{created, today, ApiJson, AppState};
use crate::errors::FleetError;
use crate::models::vehicle::{
    Battery, BatteryRequest, BrokerInfo, BrokerInfoRequest, LinkVehicleRequest, Mileage,
    MileageRequest, Tire, TireRequest, Vehicle, VehicleRegistration, VehicleRegistrationRequest,
    VehicleRequest, VehicleStatus, VehicleStatusRequest, VehicleType, VehicleTypeRequest,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/vehicletypes", get(list_vehicle_types).post(create_vehicle_type))
        .route(
            "/vehicletypes/{id}",
            get(get_vehicle_type)
                .put(update_vehicle_type)
                .delete(delete_vehicle_type),
        )
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route(
            "/vehicles/{vuid}",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route(
            "/vehicles/{vuid}/status",
            get(vehicle_statuses).post(add_vehicle_status),
        )
        .route("/vehicles/{vuid}/tires", get(vehicle_tires).post(add_tire))
        .route(
            "/vehicles/{vuid}/batteries",
            get(vehicle_batteries).post(add_battery),
        )
        .route(
            "/vehicles/{vuid}/mileage",
            get(vehicle_mileage).post(add_mileage),
        )
        .route(
            "/vehicles/{vuid}/insurance",
            get(vehicle_insurance).post(add_insurance),
        )
        .route(
            "/vehicles/{vuid}/registrations",
            get(vehicle_registrations).post(add_registration),
        )
        .route("/tires/{id}", get(get_tire).delete(delete_tire))
        .route("/batteries/{id}", get(get_battery).delete(delete_battery))
        .route(
            "/users/{uuid}/vehicles",
            get(user_vehicles).post(link_user_vehicle),
        )
}

async fn list_vehicle_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleType>>, FleetError> {
    Ok(Json(state.db.list_vehicle_types().await?))
}

async fn create_vehicle_type(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VehicleTypeRequest>,
) -> Result<(StatusCode, Json<VehicleType>), FleetError> {
    request.validate(today())?;
    Ok(created(state.db.create_vehicle_type(&request).await?))
}

async fn get_vehicle_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VehicleType>, FleetError> {
    Ok(Json(state.db.get_vehicle_type(id).await?))
}

async fn update_vehicle_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<VehicleTypeRequest>,
) -> Result<Json<VehicleType>, FleetError> {
    request.validate(today())?;
    Ok(Json(state.db.update_vehicle_type(id, &request).await?))
}

async fn delete_vehicle_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_vehicle_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_vehicles(State(state): State<AppState>) -> Result<Json<Vec<Vehicle>>, FleetError> {
    Ok(Json(state.db.list_vehicles().await?))
}

async fn create_vehicle(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), FleetError> {
    request.validate()?;
    let vehicle = state.db.create_vehicle(&request).await?;
    info!("Registered vehicle {} ({})", vehicle.vuid, vehicle.plate);
    Ok(created(vehicle))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
) -> Result<Json<Vehicle>, FleetError> {
    Ok(Json(state.db.get_vehicle(vuid).await?))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
    ApiJson(request): ApiJson<VehicleRequest>,
) -> Result<Json<Vehicle>, FleetError> {
    request.validate()?;
    Ok(Json(state.db.update_vehicle(vuid, &request).await?))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_vehicle(vuid).await?;
    info!("Deleted vehicle {}", vuid);
    Ok(StatusCode::NO_CONTENT)
}

async fn user_vehicles(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Vec<Vehicle>>, FleetError> {
    Ok(Json(state.db.user_vehicles(uuid).await?))
}

async fn link_user_vehicle(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    ApiJson(request): ApiJson<LinkVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), FleetError> {
    Ok(created(state.db.link_user_vehicle(uuid, request.vuid).await?))
}

async fn vehicle_statuses(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
) -> Result<Json<Vec<VehicleStatus>>, FleetError> {
    Ok(Json(state.db.vehicle_statuses(vuid).await?))
}

async fn add_vehicle_status(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
    ApiJson(request): ApiJson<VehicleStatusRequest>,
) -> Result<(StatusCode, Json<VehicleStatus>), FleetError> {
    Ok(created(state.db.add_vehicle_status(vuid, &request).await?))
}

async fn vehicle_tires(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
) -> Result<Json<Vec<Tire>>, FleetError> {
    Ok(Json(state.db.vehicle_tires(vuid).await?))
}

async fn add_tire(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
    ApiJson(request): ApiJson<TireRequest>,
) -> Result<(StatusCode, Json<Tire>), FleetError> {
    request.validate()?;
    Ok(created(state.db.add_tire(vuid, &request).await?))
}

async fn get_tire(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Tire>, FleetError> {
    Ok(Json(state.db.get_tire(id).await?))
}

async fn delete_tire(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_tire(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn vehicle_batteries(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
) -> Result<Json<Vec<Battery>>, FleetError> {
    Ok(Json(state.db.vehicle_batteries(vuid).await?))
}

async fn add_battery(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
    ApiJson(request): ApiJson<BatteryRequest>,
) -> Result<(StatusCode, Json<Battery>), FleetError> {
    request.validate()?;
    Ok(created(state.db.add_battery(vuid, &request).await?))
}

async fn get_battery(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Battery>, FleetError> {
    Ok(Json(state.db.get_battery(id).await?))
}

async fn delete_battery(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_battery(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn vehicle_mileage(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
) -> Result<Json<Vec<Mileage>>, FleetError> {
    Ok(Json(state.db.vehicle_mileage(vuid).await?))
}

async fn add_mileage(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
    ApiJson(request): ApiJson<MileageRequest>,
) -> Result<(StatusCode, Json<Mileage>), FleetError> {
    request.validate()?;
    Ok(created(state.db.add_mileage(vuid, &request).await?))
}

async fn vehicle_insurance(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
) -> Result<Json<Vec<BrokerInfo>>, FleetError> {
    Ok(Json(state.db.vehicle_insurance(vuid).await?))
}

async fn add_insurance(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
    ApiJson(request): ApiJson<BrokerInfoRequest>,
) -> Result<(StatusCode, Json<BrokerInfo>), FleetError> {
    request.validate(today())?;
    Ok(created(state.db.add_insurance(vuid, &request).await?))
}

async fn vehicle_registrations(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
) -> Result<Json<Vec<VehicleRegistration>>, FleetError> {
    Ok(Json(state.db.vehicle_registrations(vuid).await?))
}

async fn add_registration(
    State(state): State<AppState>,
    Path(vuid): Path<Uuid>,
    ApiJson(request): ApiJson<VehicleRegistrationRequest>,
) -> Result<(StatusCode, Json<VehicleRegistration>), FleetError> {
    request.validate(today())?;
    Ok(created(state.db.add_registration(vuid, &request).await?))
}
