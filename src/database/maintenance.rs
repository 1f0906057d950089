use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::maintenance::{
    MaintenanceManual, MaintenanceManualRequest, MaintenanceOperation, MaintenanceOperationRequest,
};

impl Database {
    pub async fn list_manuals(
        &self,
        vehicle: Option<Uuid>,
    ) -> Result<Vec<MaintenanceManual>, FleetError> {
        let manuals = sqlx::query_as::<_, MaintenanceManual>(
            "SELECT * FROM maintenance_manuals
             WHERE $1::UUID IS NULL OR vehicle_vuid = $1
             ORDER BY start_date DESC, id",
        )
        .bind(vehicle)
        .fetch_all(&self.pool)
        .await?;
        Ok(manuals)
    }

    pub async fn get_manual(&self, id: i64) -> Result<MaintenanceManual, FleetError> {
        sqlx::query_as::<_, MaintenanceManual>("SELECT * FROM maintenance_manuals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Maintenance manual", id))
    }

    pub async fn create_manual(
        &self,
        request: &MaintenanceManualRequest,
    ) -> Result<MaintenanceManual, FleetError> {
        let manual = sqlx::query_as::<_, MaintenanceManual>(
            "INSERT INTO maintenance_manuals (vehicle_vuid, start_date, advance_alerts,
             minimum_frequency, end_of_cycle)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(request.vehicle_vuid)
        .bind(request.start_date)
        .bind(&request.advance_alerts)
        .bind(&request.minimum_frequency)
        .bind(&request.end_of_cycle)
        .fetch_one(&self.pool)
        .await?;
        Ok(manual)
    }

    pub async fn update_manual(
        &self,
        id: i64,
        request: &MaintenanceManualRequest,
    ) -> Result<MaintenanceManual, FleetError> {
        sqlx::query_as::<_, MaintenanceManual>(
            "UPDATE maintenance_manuals SET
                vehicle_vuid = $2, start_date = $3, advance_alerts = $4,
                minimum_frequency = $5, end_of_cycle = $6
            WHERE id = $1
            RETURNING *",
        )
        .bind(id)
        .bind(request.vehicle_vuid)
        .bind(request.start_date)
        .bind(&request.advance_alerts)
        .bind(&request.minimum_frequency)
        .bind(&request.end_of_cycle)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Maintenance manual", id))
    }

    /// Delete a manual, refused while it has operations
    pub async fn delete_manual(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM maintenance_manuals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Maintenance manual", id)
    }

    pub async fn list_operations(
        &self,
        manual: Option<i64>,
    ) -> Result<Vec<MaintenanceOperation>, FleetError> {
        let operations = sqlx::query_as::<_, MaintenanceOperation>(
            "SELECT * FROM maintenance_operations
             WHERE $1::BIGINT IS NULL OR maintenance_manual_id = $1
             ORDER BY maintenance_manual_id, system, subsystem, id",
        )
        .bind(manual)
        .fetch_all(&self.pool)
        .await?;
        Ok(operations)
    }

    pub async fn get_operation(&self, id: i64) -> Result<MaintenanceOperation, FleetError> {
        sqlx::query_as::<_, MaintenanceOperation>(
            "SELECT * FROM maintenance_operations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Maintenance operation", id))
    }

    pub async fn create_operation(
        &self,
        request: &MaintenanceOperationRequest,
    ) -> Result<MaintenanceOperation, FleetError> {
        let operation = sqlx::query_as::<_, MaintenanceOperation>(
            "INSERT INTO maintenance_operations (
                maintenance_manual_id, system, subsystem, task, description, frequency, help_me
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *",
        )
        .bind(request.maintenance_manual_id)
        .bind(&request.system)
        .bind(&request.subsystem)
        .bind(request.task.as_str())
        .bind(&request.description)
        .bind(&request.frequency)
        .bind(&request.help_me)
        .fetch_one(&self.pool)
        .await?;
        Ok(operation)
    }

    pub async fn update_operation(
        &self,
        id: i64,
        request: &MaintenanceOperationRequest,
    ) -> Result<MaintenanceOperation, FleetError> {
        sqlx::query_as::<_, MaintenanceOperation>(
            "UPDATE maintenance_operations SET
                maintenance_manual_id = $2, system = $3, subsystem = $4, task = $5,
                description = $6, frequency = $7, help_me = $8
            WHERE id = $1
            RETURNING *",
        )
        .bind(id)
        .bind(request.maintenance_manual_id)
        .bind(&request.system)
        .bind(&request.subsystem)
        .bind(request.task.as_str())
        .bind(&request.description)
        .bind(&request.frequency)
        .bind(&request.help_me)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Maintenance operation", id))
    }

    pub async fn delete_operation(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM maintenance_operations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Maintenance operation", id)
    }
}
