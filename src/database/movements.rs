use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::movement::{
    ClosureMovementOrder, ClosureRequest, Incident, IncidentRequest, MovementOrder,
    MovementOrderRequest, MovementOrderState, MovementOrderStateRequest, MovementOrderTimeline,
};

impl Database {
    pub async fn list_movement_orders(&self) -> Result<Vec<MovementOrder>, FleetError> {
        let orders = sqlx::query_as::<_, MovementOrder>(
            "SELECT * FROM movement_orders ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn get_movement_order(&self, id: Uuid) -> Result<MovementOrder, FleetError> {
        sqlx::query_as::<_, MovementOrder>("SELECT * FROM movement_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Movement order", id))
    }

    /// Create an order, its references must exist
    pub async fn create_movement_order(
        &self,
        request: &MovementOrderRequest,
    ) -> Result<MovementOrder, FleetError> {
        let order = sqlx::query_as::<_, MovementOrder>(
            "INSERT INTO movement_orders (
                id, vehicle_vuid, driver_uuid, authorized_by, created_at, itinerary_id,
                departure_mileage_id, departure_details, departure_time_unix,
                estimated_arrival_time_unix
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(request.vehicle_vuid)
        .bind(request.driver_uuid)
        .bind(request.authorized_by)
        .bind(request.created_at())
        .bind(request.itinerary_id)
        .bind(request.departure_mileage_id)
        .bind(&request.departure_details)
        .bind(request.departure_time_unix)
        .bind(request.estimated_arrival_time_unix)
        .fetch_one(&self.pool)
        .await?;
        Ok(order)
    }

    /// Delete an order together with its states, incidents and closure
    pub async fn delete_movement_order(&self, id: Uuid) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM movement_orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Movement order", id)
    }

    pub async fn movement_order_timeline(
        &self,
        id: Uuid,
    ) -> Result<MovementOrderTimeline, FleetError> {
        let order = self.get_movement_order(id).await?;
        let states = self.list_movement_states(Some(id)).await?;
        let incidents = self.list_incidents(Some(id)).await?;
        let closure = sqlx::query_as::<_, ClosureMovementOrder>(
            "SELECT * FROM closure_movement_orders WHERE movement_order_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(MovementOrderTimeline::new(order, states, incidents, closure))
    }

    /// State log, of one order when given, oldest first
    pub async fn list_movement_states(
        &self,
        order: Option<Uuid>,
    ) -> Result<Vec<MovementOrderState>, FleetError> {
        let states = sqlx::query_as::<_, MovementOrderState>(
            "SELECT * FROM movement_order_states
             WHERE $1::UUID IS NULL OR movement_order_id = $1
             ORDER BY timestamp_unix, id",
        )
        .bind(order)
        .fetch_all(&self.pool)
        .await?;
        Ok(states)
    }

    pub async fn get_movement_state(&self, id: Uuid) -> Result<MovementOrderState, FleetError> {
        sqlx::query_as::<_, MovementOrderState>("SELECT * FROM movement_order_states WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Movement order state", id))
    }

    /// Append a state to the log of an order
    pub async fn add_movement_state(
        &self,
        request: &MovementOrderStateRequest,
    ) -> Result<MovementOrderState, FleetError> {
        let state = sqlx::query_as::<_, MovementOrderState>(
            "INSERT INTO movement_order_states (id, movement_order_id, state, timestamp_unix,
             set_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(request.movement_order_id)
        .bind(request.state.trim())
        .bind(request.timestamp())
        .bind(request.set_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(state)
    }

    pub async fn list_incidents(&self, order: Option<Uuid>) -> Result<Vec<Incident>, FleetError> {
        let incidents = sqlx::query_as::<_, Incident>(
            "SELECT * FROM incidents
             WHERE $1::UUID IS NULL OR movement_order_id = $1
             ORDER BY incident_time_unix, id",
        )
        .bind(order)
        .fetch_all(&self.pool)
        .await?;
        Ok(incidents)
    }

    pub async fn get_incident(&self, id: Uuid) -> Result<Incident, FleetError> {
        sqlx::query_as::<_, Incident>("SELECT * FROM incidents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Incident", id))
    }

    pub async fn add_incident(&self, request: &IncidentRequest) -> Result<Incident, FleetError> {
        let incident = sqlx::query_as::<_, Incident>(
            "INSERT INTO incidents (id, movement_order_id, description, incident_time_unix,
             reported_by, resolved)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(request.movement_order_id)
        .bind(&request.description)
        .bind(request.incident_time())
        .bind(request.reported_by)
        .bind(request.resolved)
        .fetch_one(&self.pool)
        .await?;
        Ok(incident)
    }

    /// Mark an incident resolved, idempotent
    pub async fn resolve_incident(&self, id: Uuid) -> Result<Incident, FleetError> {
        sqlx::query_as::<_, Incident>(
            "UPDATE incidents SET resolved = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Incident", id))
    }

    pub async fn list_closures(
        &self,
        order: Option<Uuid>,
    ) -> Result<Vec<ClosureMovementOrder>, FleetError> {
        let closures = sqlx::query_as::<_, ClosureMovementOrder>(
            "SELECT * FROM closure_movement_orders
             WHERE $1::UUID IS NULL OR movement_order_id = $1
             ORDER BY confirmation_time DESC, id",
        )
        .bind(order)
        .fetch_all(&self.pool)
        .await?;
        Ok(closures)
    }

    pub async fn get_closure(&self, id: Uuid) -> Result<ClosureMovementOrder, FleetError> {
        sqlx::query_as::<_, ClosureMovementOrder>(
            "SELECT * FROM closure_movement_orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Closure", id))
    }

    /// Close an order, a second closure of the same order is a conflict
    pub async fn close_movement_order(
        &self,
        request: &ClosureRequest,
    ) -> Result<ClosureMovementOrder, FleetError> {
        let closure = sqlx::query_as::<_, ClosureMovementOrder>(
            "INSERT INTO closure_movement_orders (
                id, movement_order_id, verified_by, confirmation_time, arrival_mileage_id,
                arrival_time_unix, compliance, extra_details, had_incident
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(request.movement_order_id)
        .bind(request.verified_by)
        .bind(request.confirmation_time())
        .bind(request.arrival_mileage_id)
        .bind(request.arrival_time_unix)
        .bind(request.compliance)
        .bind(&request.extra_details)
        .bind(request.had_incident)
        .fetch_one(&self.pool)
        .await?;
        Ok(closure)
    }
}
