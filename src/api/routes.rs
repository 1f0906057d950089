use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use super::{created, ApiJson, ApiQuery, AppState};
use crate::errors::FleetError;
use crate::models::route::{
    LinkRouteRequest, Position, PositionRequest, Route, RouteListQuery, RoutePosition,
    RoutePositionRequest, RouteRequest,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/positions", get(list_positions).post(create_position))
        .route(
            "/positions/{id}",
            get(get_position).put(update_position).delete(delete_position),
        )
        .route("/routes", get(list_routes).post(create_route))
        .route(
            "/routes/{id}",
            get(get_route).put(update_route).delete(delete_route),
        )
        .route(
            "/routes/{id}/positions",
            get(route_positions).post(add_route_position),
        )
        .route(
            "/routes/{id}/positions/{stop}",
            delete(delete_route_position),
        )
        .route(
            "/users/{uuid}/routes",
            get(user_routes).post(link_user_route),
        )
}

async fn list_positions(State(state): State<AppState>) -> Result<Json<Vec<Position>>, FleetError> {
    Ok(Json(state.db.list_positions().await?))
}

async fn create_position(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PositionRequest>,
) -> Result<(StatusCode, Json<Position>), FleetError> {
    request.validate()?;
    Ok(created(state.db.create_position(&request).await?))
}

async fn get_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Position>, FleetError> {
    Ok(Json(state.db.get_position(id).await?))
}

async fn update_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<PositionRequest>,
) -> Result<Json<Position>, FleetError> {
    request.validate()?;
    Ok(Json(state.db.update_position(id, &request).await?))
}

async fn delete_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_position(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_routes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RouteListQuery>,
) -> Result<Json<Vec<Route>>, FleetError> {
    Ok(Json(state.db.list_routes(query.name.as_deref()).await?))
}

async fn create_route(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RouteRequest>,
) -> Result<(StatusCode, Json<Route>), FleetError> {
    request.validate()?;
    Ok(created(state.db.create_route(&request).await?))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Route>, FleetError> {
    Ok(Json(state.db.get_route(id).await?))
}

async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<RouteRequest>,
) -> Result<Json<Route>, FleetError> {
    request.validate()?;
    Ok(Json(state.db.update_route(id, &request).await?))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_route(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn route_positions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RoutePosition>>, FleetError> {
    Ok(Json(state.db.route_positions(id).await?))
}

async fn add_route_position(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<RoutePositionRequest>,
) -> Result<(StatusCode, Json<RoutePosition>), FleetError> {
    request.validate()?;
    Ok(created(state.db.add_route_position(id, &request).await?))
}

async fn delete_route_position(
    State(state): State<AppState>,
    Path((id, stop)): Path<(i64, i64)>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_route_position(id, stop).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn user_routes(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Vec<Route>>, FleetError> {
    Ok(Json(state.db.user_routes(uuid).await?))
}

async fn link_user_route(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    ApiJson(request): ApiJson<LinkRouteRequest>,
) -> Result<(StatusCode, Json<Route>), FleetError> {
    Ok(created(state.db.link_user_route(uuid, request.route_id).await?))
}
