use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::device::{Device, DeviceRequest};
use crate::models::user::User;
use crate::models::Imei;

#[derive(sqlx::FromRow)]
struct UpsertedDevice {
    #[sqlx(flatten)]
    device: Device,
    inserted: bool,
}

impl Database {
    pub async fn list_devices(&self, tracking: Option<bool>) -> Result<Vec<Device>, FleetError> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT * FROM devices
             WHERE $1::BOOLEAN IS NULL OR is_tracking_alarms = $1
             ORDER BY imei",
        )
        .bind(tracking)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    pub async fn get_device(&self, imei: &str) -> Result<Device, FleetError> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE imei = $1")
            .bind(imei)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Device", imei))
    }

    /// Create the device or update the one with the same IMEI
    ///
    /// Returns the stored device and whether it was created.
    pub async fn upsert_device(
        &self,
        request: &DeviceRequest,
    ) -> Result<(Device, bool), FleetError> {
        let row = sqlx::query_as::<_, UpsertedDevice>(
            "INSERT INTO devices (
                imei, user_name, car_owner, license_number, vin,
                is_tracking_alarms, last_time_tracked, provider
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (imei) DO UPDATE SET
                user_name = EXCLUDED.user_name,
                car_owner = EXCLUDED.car_owner,
                license_number = EXCLUDED.license_number,
                vin = EXCLUDED.vin,
                is_tracking_alarms = EXCLUDED.is_tracking_alarms,
                last_time_tracked = EXCLUDED.last_time_tracked,
                provider = EXCLUDED.provider
            RETURNING *, (xmax = 0) AS inserted",
        )
        .bind(request.imei.as_str())
        .bind(&request.user_name)
        .bind(request.car_owner.as_deref())
        .bind(request.license_number.as_deref())
        .bind(request.vin.as_deref())
        .bind(request.is_tracking_alarms)
        .bind(request.last_time_tracked)
        .bind(request.provider.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok((row.device, row.inserted))
    }

    pub async fn update_device(
        &self,
        imei: &str,
        request: &DeviceRequest,
    ) -> Result<Device, FleetError> {
        sqlx::query_as::<_, Device>(
            "UPDATE devices SET
                user_name = $2,
                car_owner = $3,
                license_number = $4,
                vin = $5,
                is_tracking_alarms = $6,
                last_time_tracked = $7,
                provider = $8
            WHERE imei = $1
            RETURNING *",
        )
        .bind(imei)
        .bind(&request.user_name)
        .bind(request.car_owner.as_deref())
        .bind(request.license_number.as_deref())
        .bind(request.vin.as_deref())
        .bind(request.is_tracking_alarms)
        .bind(request.last_time_tracked)
        .bind(request.provider.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FleetError::not_found("Device", imei))
    }

    /// Delete a device, refused while alarms reference it
    pub async fn delete_device(&self, imei: &str) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM devices WHERE imei = $1")
            .bind(imei)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "Device", imei)
    }

    /// Users the device is assigned to
    pub async fn device_users(&self, imei: &str) -> Result<Vec<User>, FleetError> {
        self.get_device(imei).await?;
        let users = sqlx::query_as::<_, User>(&format!(
            "{} JOIN user_devices ud ON ud.user_uuid = u.uuid
             WHERE ud.device_imei = $1
             ORDER BY u.username",
            super::users::SELECT_USERS
        ))
        .bind(imei)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn user_devices(&self, user: Uuid) -> Result<Vec<Device>, FleetError> {
        self.get_user(user).await?;
        let devices = sqlx::query_as::<_, Device>(
            "SELECT d.* FROM devices d
             JOIN user_devices ud ON ud.device_imei = d.imei
             WHERE ud.user_uuid = $1
             ORDER BY d.imei",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    /// Assign a device to a user, a no-op if already assigned
    pub async fn link_user_device(&self, user: Uuid, imei: &Imei) -> Result<Device, FleetError> {
        self.get_user(user).await?;
        let device = self.get_device(imei.as_str()).await?;
        sqlx::query(
            "INSERT INTO user_devices (user_uuid, device_imei) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user)
        .bind(imei.as_str())
        .execute(&self.pool)
        .await?;
        Ok(device)
    }
}
