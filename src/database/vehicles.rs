use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::vehicle::{Vehicle, VehicleRequest, VehicleType, VehicleTypeRequest};

impl Database {
    pub async fn list_vehicle_types(&self) -> Result<Vec<VehicleType>, FleetError> {
        let types = sqlx::query_as::<_, VehicleType>("SELECT * FROM vehicle_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(types)
    }

    pub async fn get_vehicle_type(&self, id: i64) -> Result<VehicleType, FleetError> {
        sqlx::query_as::<_, VehicleType>("SELECT * FROM vehicle_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Vehicle type", id))
    }

    pub async fn create_vehicle_type(
        &self,
        request: &VehicleTypeRequest,
    ) -> Result<VehicleType, FleetError> {
        let created = sqlx::query_as::<_, VehicleType>(
            "INSERT INTO vehicle_types (
                year, brand, model, version, fuel_type, fuel_value, engine_displacement,
                vehicle_type, city_mileage, highway_mileage, mixed_mileage
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *",
        )
        .bind(request.year)
        .bind(&request.brand)
        .bind(&request.model)
        .bind(&request.version)
        .bind(request.fuel_type.as_str())
        .bind(request.fuel_value)
        .bind(request.engine_displacement)
        .bind(request.vehicle_type.as_str())
        .bind(request.city_mileage)
        .bind(request.highway_mileage)
        .bind(request.mixed_mileage)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update_vehicle_type(
        &self,
        id: i64,
        request: &VehicleTypeRequest,
    ) -> Result<VehicleType, FleetError> {
        sqlx::query_as::<_, VehicleType>(
            "UPDATE vehicle_types SET
                year = $2, brand = $3, model = $4, version = $5, fuel_type = $6,
                fuel_value = $7, engine_displacement = $8, vehicle_type = $9,
                city_mileage = $10, highway_mileage = $11, mixed_mileage = $12
            WHERE id = $1
            RETURNING *",
        )
        .bind(id)
        .bind(request.year)
        .bind(&request.brand)
        .bind(&request.model)
        .bind(&request.version)
        .bind(request.fuel_type.as_str())
        .bind(request.fuel_value)
        .bind(request.engine_displacement)
        .bind(request.vehicle_type.as_str())
        .bind(request.city_mileage)
        .bind(request.highway_mileage)
        .bind(request.mixed_mileage)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Vehicle type", id))
    }

    pub async fn delete_vehicle_type(&self, id: i64) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM vehicle_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Vehicle type", id)
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, FleetError> {
        let vehicles = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles ORDER BY plate, vuid")
            .fetch_all(&self.pool)
            .await?;
        Ok(vehicles)
    }

    pub async fn get_vehicle(&self, vuid: Uuid) -> Result<Vehicle, FleetError> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE vuid = $1")
            .bind(vuid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Vehicle", vuid))
    }

    pub async fn create_vehicle(&self, request: &VehicleRequest) -> Result<Vehicle, FleetError> {
        let created = sqlx::query_as::<_, Vehicle>(
            "INSERT INTO vehicles (vuid, vehicle_type_id, device_imei, color, chassis, plate,
             tonnage, vin)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(request.vehicle_type_id)
        .bind(request.device_imei.as_ref().map(|imei| imei.as_str()))
        .bind(request.color.to_uppercase())
        .bind(&request.chassis)
        .bind(&request.plate)
        .bind(request.tonnage)
        .bind(&request.vin)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update_vehicle(
        &self,
        vuid: Uuid,
        request: &VehicleRequest,
    ) -> Result<Vehicle, FleetError> {
        sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET
                vehicle_type_id = $2, device_imei = $3, color = $4,
                chassis = $5, plate = $6, tonnage = $7, vin = $8
            WHERE vuid = $1
            RETURNING *",
        )
        .bind(vuid)
        .bind(request.vehicle_type_id)
        .bind(request.device_imei.as_ref().map(|imei| imei.as_str()))
        .bind(request.color.to_uppercase())
        .bind(&request.chassis)
        .bind(&request.plate)
        .bind(request.tonnage)
        .bind(&request.vin)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Vehicle", vuid))
    }

    pub async fn delete_vehicle(&self, vuid: Uuid) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE vuid = $1")
            .bind(vuid)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Vehicle", vuid)
    }

    pub async fn user_vehicles(&self, user: Uuid) -> Result<Vec<Vehicle>, FleetError> {
        self.get_user(user).await?;
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT v.* FROM vehicles v
             JOIN user_vehicles uv ON uv.vehicle_vuid = v.vuid
             WHERE uv.user_uuid = $1
             ORDER BY v.plate, v.vuid",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    /// Assign a vehicle to a user, a no-op if already assigned
    pub async fn link_user_vehicle(&self, user: Uuid, vuid: Uuid) -> Result<Vehicle, FleetError> {
        self.get_user(user).await?;
        let vehicle = self.get_vehicle(vuid).await?;
        sqlx::query(
            "INSERT INTO user_vehicles (user_uuid, vehicle_vuid) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user)
        .bind(vuid)
        .execute(&self.pool)
        .await?;
        Ok(vehicle)
    }
}
