//! Movement order lifecycle endpoints.
//!
//! Orders are immutable once created and the state log is append-only, so
//! those resources answer 405 to updates.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use super::{created, not_allowed, ApiJson, ApiQuery, AppState};
use crate::errors::FleetError;
use crate::models::movement::{
    ClosureMovementOrder, ClosureRequest, Incident, IncidentRequest, MovementOrder,
    MovementOrderRequest, MovementOrderState, MovementOrderStateRequest, MovementOrderTimeline,
    OrderQuery,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/movements/orders", get(list_orders).post(create_order))
        .route(
            "/movements/orders/{id}",
            get(get_order)
                .delete(delete_order)
                .put(not_allowed)
                .patch(not_allowed),
        )
        .route("/movements/orders/{id}/timeline", get(order_timeline))
        .route("/movements/states", get(list_states).post(add_state))
        .route(
            "/movements/states/{id}",
            get(get_state)
                .put(not_allowed)
                .patch(not_allowed)
                .delete(not_allowed),
        )
        .route(
            "/movements/incidents",
            get(list_incidents).post(add_incident),
        )
        .route("/movements/incidents/{id}", get(get_incident))
        .route("/movements/incidents/{id}/resolve", post(resolve_incident))
        .route("/movements/closures", get(list_closures).post(close_order))
        .route("/movements/closures/{id}", get(get_closure))
}

async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<MovementOrder>>, FleetError> {
    Ok(Json(state.db.list_movement_orders().await?))
}

async fn create_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MovementOrderRequest>,
) -> Result<(StatusCode, Json<MovementOrder>), FleetError> {
    request.validate()?;
    let order = state.db.create_movement_order(&request).await?;
    info!(
        "Created movement order {} for vehicle {}",
        order.id, order.vehicle_vuid
    );
    Ok(created(order))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MovementOrder>, FleetError> {
    Ok(Json(state.db.get_movement_order(id).await?))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_movement_order(id).await?;
    info!("Deleted movement order {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn order_timeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MovementOrderTimeline>, FleetError> {
    Ok(Json(state.db.movement_order_timeline(id).await?))
}

async fn list_states(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<Vec<MovementOrderState>>, FleetError> {
    Ok(Json(state.db.list_movement_states(query.order).await?))
}

async fn add_state(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MovementOrderStateRequest>,
) -> Result<(StatusCode, Json<MovementOrderState>), FleetError> {
    request.validate()?;
    let logged = state.db.add_movement_state(&request).await?;
    info!(
        "Movement order {} is now {}",
        logged.movement_order_id, logged.state
    );
    Ok(created(logged))
}

async fn get_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MovementOrderState>, FleetError> {
    Ok(Json(state.db.get_movement_state(id).await?))
}

async fn list_incidents(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<Vec<Incident>>, FleetError> {
    Ok(Json(state.db.list_incidents(query.order).await?))
}

async fn add_incident(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IncidentRequest>,
) -> Result<(StatusCode, Json<Incident>), FleetError> {
    request.validate()?;
    Ok(created(state.db.add_incident(&request).await?))
}

async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Incident>, FleetError> {
    Ok(Json(state.db.get_incident(id).await?))
}

async fn resolve_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Incident>, FleetError> {
    Ok(Json(state.db.resolve_incident(id).await?))
}

async fn list_closures(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<Vec<ClosureMovementOrder>>, FleetError> {
    Ok(Json(state.db.list_closures(query.order).await?))
}

async fn close_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ClosureRequest>,
) -> Result<(StatusCode, Json<ClosureMovementOrder>), FleetError> {
    request.validate()?;
    let closure = state.db.close_movement_order(&request).await?;
    info!(
        "Closed movement order {} (compliance: {})",
        closure.movement_order_id, closure.compliance
    );
    Ok(created(closure))
}

async fn get_closure(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClosureMovementOrder>, FleetError> {
    Ok(Json(state.db.get_closure(id).await?))
}
