use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;

use super::{created, ApiJson, ApiQuery, AppState};
use crate::errors::FleetError;
use crate::models::work_order::{
    WorkOrder, WorkOrderCompletion, WorkOrderCompletionRequest, WorkOrderQuery, WorkOrderRequest,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/work-orders", get(list_work_orders).post(create_work_order))
        .route(
            "/work-orders/{id}",
            get(get_work_order)
                .put(update_work_order)
                .delete(delete_work_order),
        )
        .route(
            "/work-orders/{id}/completions",
            get(list_completions).post(add_completion),
        )
}

async fn list_work_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WorkOrderQuery>,
) -> Result<Json<Vec<WorkOrder>>, FleetError> {
    Ok(Json(state.db.list_work_orders(query.vehicle).await?))
}

async fn create_work_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<WorkOrderRequest>,
) -> Result<(StatusCode, Json<WorkOrder>), FleetError> {
    request.validate()?;
    let order = state.db.create_work_order(&request).await?;
    info!("Created work order {} for vehicle {}", order.id, order.vehicle_vuid);
    Ok(created(order))
}

async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WorkOrder>, FleetError> {
    Ok(Json(state.db.get_work_order(id).await?))
}

async fn update_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<WorkOrderRequest>,
) -> Result<Json<WorkOrder>, FleetError> {
    request.validate()?;
    Ok(Json(state.db.update_work_order(id, &request).await?))
}

async fn delete_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_work_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_completions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<WorkOrderCompletion>>, FleetError> {
    Ok(Json(state.db.work_order_completions(id).await?))
}

async fn add_completion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<WorkOrderCompletionRequest>,
) -> Result<(StatusCode, Json<WorkOrderCompletion>), FleetError> {
    Ok(created(state.db.add_completion(id, &request).await?))
}
