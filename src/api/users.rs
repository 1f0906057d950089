use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use super::{created, ApiJson, AppState};
use crate::errors::FleetError;
use crate::models::user::{User, UserRequest};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{uuid}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{uuid}/children", get(user_children))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, FleetError> {
    Ok(Json(state.db.list_users().await?))
}

async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<(StatusCode, Json<User>), FleetError> {
    request.validate()?;
    let user = state.db.create_user(&request).await?;
    info!("Created user {} ({})", user.username, user.uuid);
    Ok(created(user))
}

async fn get_user(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<User>, FleetError> {
    Ok(Json(state.db.get_user(uuid).await?))
}

async fn update_user(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<Json<User>, FleetError> {
    request.validate()?;
    Ok(Json(state.db.update_user(uuid, &request).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<StatusCode, FleetError> {
    state.db.delete_user(uuid).await?;
    info!("Deleted user {}", uuid);
    Ok(StatusCode::NO_CONTENT)
}

async fn user_children(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<Vec<User>>, FleetError> {
    Ok(Json(state.db.user_children(uuid).await?))
}
