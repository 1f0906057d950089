//! GPS tracking devices.

use serde::{Deserialize, Serialize};

use crate::models::Imei;
use crate::validation::{validate_max_len, validate_not_blank, ValidationError};

string_enum! {
    /// Satellite tracking provider
    pub enum Provider ("provider") {
        WanWayTech => "WanWayTech",
        WhatsGps => "WhatsGPS",
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::WanWayTech
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Device {
    pub imei: String,
    pub user_name: String,
    pub car_owner: Option<String>,
    pub license_number: Option<String>,
    pub vin: Option<String>,
    pub is_tracking_alarms: bool,
    /// Last time the device alarms were polled, seconds from Unix epoch
    pub last_time_tracked: i64,
    #[sqlx(try_from = "String")]
    pub provider: Provider,
}

/// Body of device create and update requests
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRequest {
    pub imei: Imei,
    pub user_name: String,
    #[serde(default)]
    pub car_owner: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub is_tracking_alarms: bool,
    #[serde(default)]
    pub last_time_tracked: i64,
    #[serde(default)]
    pub provider: Provider,
}

impl DeviceRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("user_name", &self.user_name)?;
        validate_max_len("user_name", &self.user_name, 255)?;
        if self.last_time_tracked < 0 {
            return Err(ValidationError::field(
                "last_time_tracked",
                "must be a Unix timestamp",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceListQuery {
    pub is_tracking_alarms: Option<String>,
}

impl DeviceListQuery {
    /// `Some(true)` only for a literal "true", any other given value is `Some(false)`
    pub fn tracking_filter(&self) -> Option<bool> {
        self.is_tracking_alarms
            .as_deref()
            .map(|value| value.eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkDeviceRequest {
    pub imei: Imei,
}
