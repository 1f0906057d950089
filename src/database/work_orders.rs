use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::work_order::{
    WorkOrder, WorkOrderCompletion, WorkOrderCompletionRequest, WorkOrderRequest,
};

impl Database {
    pub async fn list_work_orders(
        &self,
        vehicle: Option<Uuid>,
    ) -> Result<Vec<WorkOrder>, FleetError> {
        let orders = sqlx::query_as::<_, WorkOrder>(
            "SELECT * FROM work_orders
             WHERE $1::UUID IS NULL OR vehicle_vuid = $1
             ORDER BY issue_date_unix DESC, id DESC",
        )
        .bind(vehicle)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn get_work_order(&self, id: i64) -> Result<WorkOrder, FleetError> {
        sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Work order", id))
    }

    pub async fn create_work_order(
        &self,
        request: &WorkOrderRequest,
    ) -> Result<WorkOrder, FleetError> {
        let order = sqlx::query_as::<_, WorkOrder>(
            "INSERT INTO work_orders (responsible, created_by, vehicle_vuid, issue_date_unix,
             maintenance_type, work_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(request.responsible)
        .bind(request.created_by)
        .bind(request.vehicle_vuid)
        .bind(request.issue_date())
        .bind(&request.maintenance_type)
        .bind(&request.work_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(order)
    }

    pub async fn update_work_order(
        &self,
        id: i64,
        request: &WorkOrderRequest,
    ) -> Result<WorkOrder, FleetError> {
        sqlx::query_as::<_, WorkOrder>(
            "UPDATE work_orders SET
                responsible = $2, created_by = $3, vehicle_vuid = $4,
                issue_date_unix = $5, maintenance_type = $6, work_type = $7
            WHERE id = $1
            RETURNING *",
        )
        .bind(id)
        .bind(request.responsible)
        .bind(request.created_by)
        .bind(request.vehicle_vuid)
        .bind(request.issue_date())
        .bind(&request.maintenance_type)
        .bind(&request.work_type)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Work order", id))
    }

    pub async fn delete_work_order(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Work order", id)
    }

    /// Completion log of a work order, latest first
    pub async fn work_order_completions(
        &self,
        id: i64,
    ) -> Result<Vec<WorkOrderCompletion>, FleetError> {
        self.get_work_order(id).await?;
        let completions = sqlx::query_as::<_, WorkOrderCompletion>(
            "SELECT * FROM work_order_completions WHERE work_order_id = $1
             ORDER BY change_date_unix DESC, id DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(completions)
    }

    pub async fn add_completion(
        &self,
        id: i64,
        request: &WorkOrderCompletionRequest,
    ) -> Result<WorkOrderCompletion, FleetError> {
        self.get_work_order(id).await?;
        let completion = sqlx::query_as::<_, WorkOrderCompletion>(
            "INSERT INTO work_order_completions (work_order_id, status, change_registered_by,
             change_date_unix, responsible_notes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(id)
        .bind(request.status.as_str())
        .bind(request.change_registered_by)
        .bind(request.change_date())
        .bind(&request.responsible_notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(completion)
    }
}
