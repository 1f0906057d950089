use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::license::{License, LicenseRequest};

impl Database {
    pub async fn list_licenses(&self, driver: Option<Uuid>) -> Result<Vec<License>, FleetError> {
        let licenses = sqlx::query_as::<_, License>(
            "SELECT * FROM licenses
             WHERE $1::UUID IS NULL OR driver_uuid = $1
             ORDER BY expiry_date DESC, id",
        )
        .bind(driver)
        .fetch_all(&self.pool)
        .await?;
        Ok(licenses)
    }

    pub async fn user_licenses(&self, user: Uuid) -> Result<Vec<License>, FleetError> {
        self.get_user(user).await?;
        self.list_licenses(Some(user)).await
    }

    pub async fn get_license(&self, id: i64) -> Result<License, FleetError> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("License", id))
    }

    pub async fn create_license(
        &self,
        driver: Uuid,
        request: &LicenseRequest,
    ) -> Result<License, FleetError> {
        let license = sqlx::query_as::<_, License>(
            "INSERT INTO licenses (driver_uuid, license_type, issue_date, expiry_date, points)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(driver)
        .bind(request.license_type.as_str())
        .bind(request.issue_date)
        .bind(request.expiry_date)
        .bind(request.points)
        .fetch_one(&self.pool)
        .await?;
        Ok(license)
    }

    pub async fn update_license(
        &self,
        id: i64,
        driver: Uuid,
        request: &LicenseRequest,
    ) -> Result<License, FleetError> {
        sqlx::query_as::<_, License>(
            "UPDATE licenses SET
                driver_uuid = $2, license_type = $3, issue_date = $4, expiry_date = $5, points = $6
            WHERE id = $1
            RETURNING *",
        )
        .bind(id)
        .bind(driver)
        .bind(request.license_type.as_str())
        .bind(request.issue_date)
        .bind(request.expiry_date)
        .bind(request.points)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("License", id))
    }

    pub async fn delete_license(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM licenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "License", id)
    }
}
