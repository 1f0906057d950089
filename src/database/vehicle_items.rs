//! Logs and items recorded against a single vehicle.

use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::vehicle::{
    Battery, BatteryRequest, BrokerInfo, BrokerInfoRequest, Mileage, MileageRequest, Tire,
    TireRequest, VehicleRegistration, VehicleRegistrationRequest, VehicleStatus,
    VehicleStatusRequest,
};

impl Database {
    pub async fn vehicle_statuses(&self, vuid: Uuid) -> Result<Vec<VehicleStatus>, FleetError> {
        self.get_vehicle(vuid).await?;
        let statuses = sqlx::query_as::<_, VehicleStatus>(
            "SELECT * FROM vehicle_statuses WHERE vehicle_vuid = $1
             ORDER BY status_updated_at DESC, id DESC",
        )
        .bind(vuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(statuses)
    }

    pub async fn add_vehicle_status(
        &self,
        vuid: Uuid,
        request: &VehicleStatusRequest,
    ) -> Result<VehicleStatus, FleetError> {
        self.get_vehicle(vuid).await?;
        let status = sqlx::query_as::<_, VehicleStatus>(
            "INSERT INTO vehicle_statuses (vehicle_vuid, condition, status_updated_at)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(vuid)
        .bind(request.condition.as_str())
        .bind(request.updated_at())
        .fetch_one(&self.pool)
        .await?;
        Ok(status)
    }

    pub async fn vehicle_tires(&self, vuid: Uuid) -> Result<Vec<Tire>, FleetError> {
        self.get_vehicle(vuid).await?;
        let tires =
            sqlx::query_as::<_, Tire>("SELECT * FROM tires WHERE vehicle_vuid = $1 ORDER BY id")
                .bind(vuid)
                .fetch_all(&self.pool)
                .await?;
        Ok(tires)
    }

    pub async fn get_tire(&self, id: i64) -> Result<Tire, FleetError> {
        sqlx::query_as::<_, Tire>("SELECT * FROM tires WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Tire", id))
    }

    pub async fn add_tire(&self, vuid: Uuid, request: &TireRequest) -> Result<Tire, FleetError> {
        self.get_vehicle(vuid).await?;
        let item = &request.item;
        let tire = sqlx::query_as::<_, Tire>(
            "INSERT INTO tires (
                vehicle_vuid, manufacturing_code, position_relative_to_vehicle,
                registration_date, in_use, location, notes, manufacturer, cost
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *",
        )
        .bind(vuid)
        .bind(&request.manufacturing_code)
        .bind(request.position_relative_to_vehicle.as_str())
        .bind(item.registration_date)
        .bind(item.in_use)
        .bind(&item.location)
        .bind(&item.notes)
        .bind(&item.manufacturer)
        .bind(item.cost)
        .fetch_one(&self.pool)
        .await?;
        Ok(tire)
    }

    pub async fn delete_tire(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM tires WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Tire", id)
    }

    pub async fn vehicle_batteries(&self, vuid: Uuid) -> Result<Vec<Battery>, FleetError> {
        self.get_vehicle(vuid).await?;
        let batteries = sqlx::query_as::<_, Battery>(
            "SELECT * FROM batteries WHERE vehicle_vuid = $1 ORDER BY id",
        )
        .bind(vuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(batteries)
    }

    pub async fn get_battery(&self, id: i64) -> Result<Battery, FleetError> {
        sqlx::query_as::<_, Battery>("SELECT * FROM batteries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Battery", id))
    }

    pub async fn add_battery(
        &self,
        vuid: Uuid,
        request: &BatteryRequest,
    ) -> Result<Battery, FleetError> {
        self.get_vehicle(vuid).await?;
        let item = &request.item;
        let battery = sqlx::query_as::<_, Battery>(
            "INSERT INTO batteries (
                vehicle_vuid, manufacturing_code, registration_date,
                in_use, location, notes, manufacturer, cost
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *",
        )
        .bind(vuid)
        .bind(&request.manufacturing_code)
        .bind(item.registration_date)
        .bind(item.in_use)
        .bind(&item.location)
        .bind(&item.notes)
        .bind(&item.manufacturer)
        .bind(item.cost)
        .fetch_one(&self.pool)
        .await?;
        Ok(battery)
    }

    pub async fn delete_battery(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM batteries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Battery", id)
    }

    pub async fn vehicle_mileage(&self, vuid: Uuid) -> Result<Vec<Mileage>, FleetError> {
        self.get_vehicle(vuid).await?;
        let records = sqlx::query_as::<_, Mileage>(
            "SELECT * FROM mileages WHERE vehicle_vuid = $1
             ORDER BY unix_time_registered DESC, id DESC",
        )
        .bind(vuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn add_mileage(
        &self,
        vuid: Uuid,
        request: &MileageRequest,
    ) -> Result<Mileage, FleetError> {
        self.get_vehicle(vuid).await?;
        let record = sqlx::query_as::<_, Mileage>(
            "INSERT INTO mileages (vehicle_vuid, mileage, unit, unix_time_registered)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(vuid)
        .bind(request.mileage)
        .bind(request.unit.as_str())
        .bind(request.registered_at())
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn vehicle_insurance(&self, vuid: Uuid) -> Result<Vec<BrokerInfo>, FleetError> {
        self.get_vehicle(vuid).await?;
        let infos = sqlx::query_as::<_, BrokerInfo>(
            "SELECT * FROM broker_infos WHERE vehicle_vuid = $1 ORDER BY expiry_date DESC",
        )
        .bind(vuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(infos)
    }

    pub async fn add_insurance(
        &self,
        vuid: Uuid,
        request: &BrokerInfoRequest,
    ) -> Result<BrokerInfo, FleetError> {
        self.get_vehicle(vuid).await?;
        let info = sqlx::query_as::<_, BrokerInfo>(
            "INSERT INTO broker_infos (id, vehicle_vuid, issue_date, expiry_date,
             insurance_company, broker_name)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(vuid)
        .bind(request.issue_date)
        .bind(request.expiry_date)
        .bind(&request.insurance_company)
        .bind(&request.broker_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(info)
    }

    pub async fn vehicle_registrations(
        &self,
        vuid: Uuid,
    ) -> Result<Vec<VehicleRegistration>, FleetError> {
        self.get_vehicle(vuid).await?;
        let registrations = sqlx::query_as::<_, VehicleRegistration>(
            "SELECT * FROM vehicle_registrations WHERE vehicle_vuid = $1 ORDER BY expiry_date DESC",
        )
        .bind(vuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(registrations)
    }

    pub async fn add_registration(
        &self,
        vuid: Uuid,
        request: &VehicleRegistrationRequest,
    ) -> Result<VehicleRegistration, FleetError> {
        self.get_vehicle(vuid).await?;
        let registration = sqlx::query_as::<_, VehicleRegistration>(
            "INSERT INTO vehicle_registrations (id, vehicle_vuid, issue_date, expiry_date)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(vuid)
        .bind(request.issue_date)
        .bind(request.expiry_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(registration)
    }
}
