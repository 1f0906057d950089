use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::Database;
use crate::errors::FleetError;
use crate::filters::{AlarmFilter, TimeWindow};
use crate::ingest::AlarmStore;
use crate::models::alarm::{Alarm, AlarmCode, NewAlarm};
use crate::validation::ValidationError;

impl Database {
    /// Alarms matching the filter, newest first
    pub async fn list_alarms(&self, filter: &AlarmFilter) -> Result<Vec<Alarm>, FleetError> {
        if !self.device_exists(filter.imei.as_str()).await? {
            return Err(ValidationError::field(
                "imei",
                "an IMEI from a registered device is required",
            )
            .into());
        }

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM alarms WHERE device_imei = ");
        query.push_bind(filter.imei.to_string());

        match filter.window {
            TimeWindow::Since(start) => {
                query.push(" AND time >= ").push_bind(start);
            }
            TimeWindow::Between(start, end) => {
                query
                    .push(" AND time BETWEEN ")
                    .push_bind(start)
                    .push(" AND ")
                    .push_bind(end);
            }
        }

        if let Some(codes) = &filter.alarm_codes {
            let codes: Vec<String> = codes.iter().map(|c| c.as_str().to_string()).collect();
            query.push(" AND alarm_code = ANY(").push_bind(codes).push(")");
        }

        query.push(" ORDER BY time DESC, id DESC");

        let alarms = query
            .build_query_as::<Alarm>()
            .fetch_all(&self.pool)
            .await?;
        Ok(alarms)
    }

    pub async fn get_alarm(&self, id: i64) -> Result<Alarm, FleetError> {
        sqlx::query_as::<_, Alarm>("SELECT * FROM alarms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Alarm", id))
    }
}

#[async_trait]
impl AlarmStore for Database {
    async fn device_exists(&self, imei: &str) -> Result<bool, FleetError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM devices WHERE imei = $1)")
                .bind(imei)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_alarm(
        &self,
        imei: &str,
        time: i64,
        alarm_code: AlarmCode,
    ) -> Result<Option<Alarm>, FleetError> {
        let alarm = sqlx::query_as::<_, Alarm>(
            "SELECT * FROM alarms WHERE device_imei = $1 AND time = $2 AND alarm_code = $3",
        )
        .bind(imei)
        .bind(time)
        .bind(alarm_code.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(alarm)
    }

    async fn find_nearby_address(
        &self,
        lat: f64,
        lng: f64,
        epsilon: f64,
    ) -> Result<Option<String>, FleetError> {
        let address = sqlx::query_scalar(
            "SELECT address FROM alarms
             WHERE address IS NOT NULL AND btrim(address) <> ''
               AND lat BETWEEN $1 - $3 AND $1 + $3
               AND lng BETWEEN $2 - $3 AND $2 + $3
             ORDER BY time DESC
             LIMIT 1",
        )
        .bind(lat)
        .bind(lng)
        .bind(epsilon)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    async fn insert_alarm(&self, alarm: &NewAlarm) -> Result<Option<Alarm>, FleetError> {
        let address = alarm.address.as_deref().filter(|a| !a.trim().is_empty());
        let created = sqlx::query_as::<_, Alarm>(
            "INSERT INTO alarms (
                device_imei, lat, lng, time, address, alarm_code,
                alarm_type, course, device_type, position_type, speed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (device_imei, time, alarm_code) DO NOTHING
            RETURNING *",
        )
        .bind(alarm.device_imei.as_str())
        .bind(alarm.lat)
        .bind(alarm.lng)
        .bind(alarm.time)
        .bind(address)
        .bind(alarm.alarm_code.as_str())
        .bind(alarm.alarm_type)
        .bind(alarm.course)
        .bind(alarm.device_type)
        .bind(alarm.position_type.as_deref())
        .bind(alarm.speed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(created)
    }

    async fn set_alarm_address(&self, id: i64, address: &str) -> Result<Alarm, FleetError> {
        sqlx::query_as::<_, Alarm>("UPDATE alarms SET address = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(address)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("Alarm", id))
    }
}
