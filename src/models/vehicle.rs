//! Vehicles and the items tracked against them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{unix_now, Imei};
use crate::validation::{
    validate_battery_code, validate_color, validate_dot_code, validate_expiry_date,
    validate_issue_date, validate_manufacture_year, validate_max_len, validate_non_negative,
    validate_not_blank, validate_vehicle_plate, ValidationError,
};

string_enum! {
    pub enum FuelType ("fuel_type") {
        Gasoline => "Gasoline",
        Diesel => "Diesel",
        Gas => "Gas",
        Electric => "Electric",
    }
}

string_enum! {
    pub enum VehicleKind ("vehicle_type") {
        Car => "car",
        Truck => "truck",
        Motorcycle => "motorcycle",
        Van => "van",
        Bus => "bus",
        Bicycle => "bicycle",
    }
}

string_enum! {
    pub enum VehicleCondition ("condition") {
        Operable => "Operable",
        Inoperable => "Inoperable",
        UnderMaintenance => "Under Maintenance",
    }
}

string_enum! {
    pub enum TirePosition ("position_relative_to_vehicle") {
        FrontRight => "Front Right",
        RearRight => "Rear Right",
        RearRightOuter => "Rear Right Outer",
        RearRightInner => "Rear Right Inner",
        FrontLeft => "Front Left",
        RearLeft => "Rear Left",
        RearLeftOuter => "Rear Left Outer",
        RearLeftInner => "Rear Left Inner",
        Spare => "Spare",
    }
}

string_enum! {
    /// Odometer units, distance or elapsed time
    pub enum OdometerUnit ("unit") {
        Meters => "m",
        Kilometers => "km",
        Miles => "mi",
        NauticalMiles => "nmi",
        Minutes => "min",
        Hours => "h",
        Days => "d",
        Weeks => "w",
        Months => "mo",
        Years => "y",
    }
}

impl Default for FuelType {
    fn default() -> Self {
        FuelType::Gasoline
    }
}

impl Default for VehicleKind {
    fn default() -> Self {
        VehicleKind::Car
    }
}

impl Default for VehicleCondition {
    fn default() -> Self {
        VehicleCondition::Operable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VehicleType {
    pub id: i64,
    pub year: i32,
    pub brand: String,
    pub model: String,
    pub version: String,
    #[sqlx(try_from = "String")]
    pub fuel_type: FuelType,
    pub fuel_value: f64,
    pub engine_displacement: f64,
    #[sqlx(try_from = "String")]
    pub vehicle_type: VehicleKind,
    pub city_mileage: f64,
    pub highway_mileage: f64,
    pub mixed_mileage: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleTypeRequest {
    pub year: i32,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub fuel_type: FuelType,
    #[serde(default)]
    pub fuel_value: f64,
    #[serde(default)]
    pub engine_displacement: f64,
    #[serde(default)]
    pub vehicle_type: VehicleKind,
    #[serde(default)]
    pub city_mileage: f64,
    #[serde(default)]
    pub highway_mileage: f64,
    #[serde(default)]
    pub mixed_mileage: f64,
}

impl VehicleTypeRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        validate_manufacture_year(self.year, today)?;
        validate_not_blank("brand", &self.brand)?;
        validate_not_blank("model", &self.model)?;
        for (field, value) in [
            ("fuel_value", self.fuel_value),
            ("engine_displacement", self.engine_displacement),
            ("city_mileage", self.city_mileage),
            ("highway_mileage", self.highway_mileage),
            ("mixed_mileage", self.mixed_mileage),
        ] {
            validate_non_negative(field, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Vehicle {
    pub vuid: Uuid,
    pub vehicle_type_id: i64,
    pub device_imei: Option<String>,
    /// Hexadecimal RGB without the leading `#`
    pub color: String,
    pub chassis: String,
    pub plate: String,
    pub tonnage: f64,
    pub vin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRequest {
    pub vehicle_type_id: i64,
    #[serde(default)]
    pub device_imei: Option<Imei>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub chassis: String,
    #[serde(default)]
    pub plate: String,
    #[serde(default)]
    pub tonnage: f64,
    #[serde(default)]
    pub vin: String,
}

fn default_color() -> String {
    "FFFFFF".to_string()
}

impl VehicleRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_color(&self.color)?;
        // Plate is optional, but must be well formed when given
        if !self.plate.is_empty() {
            validate_vehicle_plate(&self.plate)?;
        }
        validate_non_negative("tonnage", self.tonnage)?;
        validate_max_len("chassis", &self.chassis, 255)?;
        validate_max_len("vin", &self.vin, 31)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VehicleStatus {
    pub id: i64,
    pub vehicle_vuid: Uuid,
    #[sqlx(try_from = "String")]
    pub condition: VehicleCondition,
    pub status_updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleStatusRequest {
    #[serde(default)]
    pub condition: VehicleCondition,
    #[serde(default)]
    pub status_updated_at: Option<i64>,
}

impl VehicleStatusRequest {
    pub fn updated_at(&self) -> i64 {
        self.status_updated_at.unwrap_or_else(unix_now)
    }
}

/// Fields common to tires and batteries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackedItem {
    pub registration_date: i64,
    #[serde(default = "default_in_use")]
    pub in_use: bool,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub cost: Option<f64>,
}

fn default_in_use() -> bool {
    true
}

impl TrackedItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_max_len("location", &self.location, 255)?;
        validate_max_len("manufacturer", &self.manufacturer, 255)?;
        if let Some(cost) = self.cost {
            validate_non_negative("cost", cost)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Tire {
    pub id: i64,
    pub vehicle_vuid: Uuid,
    pub manufacturing_code: String,
    #[sqlx(try_from = "String")]
    pub position_relative_to_vehicle: TirePosition,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: TrackedItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TireRequest {
    pub manufacturing_code: String,
    pub position_relative_to_vehicle: TirePosition,
    #[serde(flatten)]
    pub item: TrackedItem,
}

impl TireRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dot_code(&self.manufacturing_code)?;
        self.item.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Battery {
    pub id: i64,
    pub vehicle_vuid: Uuid,
    pub manufacturing_code: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: TrackedItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatteryRequest {
    pub manufacturing_code: String,
    #[serde(flatten)]
    pub item: TrackedItem,
}

impl BatteryRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_battery_code(&self.manufacturing_code)?;
        validate_max_len("manufacturing_code", &self.manufacturing_code, 50)?;
        self.item.validate()
    }
}

/// Odometer reading
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Mileage {
    pub id: i64,
    pub vehicle_vuid: Uuid,
    pub mileage: f64,
    #[sqlx(try_from = "String")]
    pub unit: OdometerUnit,
    pub unix_time_registered: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MileageRequest {
    pub mileage: f64,
    pub unit: OdometerUnit,
    #[serde(default)]
    pub unix_time_registered: Option<i64>,
}

impl MileageRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_negative("mileage", self.mileage)
    }

    pub fn registered_at(&self) -> i64 {
        self.unix_time_registered.unwrap_or_else(unix_now)
    }
}

/// Insurance broker information
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BrokerInfo {
    pub id: Uuid,
    pub vehicle_vuid: Uuid,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub insurance_company: String,
    pub broker_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerInfoRequest {
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub insurance_company: String,
    pub broker_name: String,
}

impl BrokerInfoRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        validate_issue_date(self.issue_date, today)?;
        validate_expiry_date(self.expiry_date, today)?;
        validate_not_blank("insurance_company", &self.insurance_company)?;
        validate_not_blank("broker_name", &self.broker_name)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VehicleRegistration {
    pub id: Uuid,
    pub vehicle_vuid: Uuid,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRegistrationRequest {
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl VehicleRegistrationRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        validate_issue_date(self.issue_date, today)?;
        validate_expiry_date(self.expiry_date, today)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkVehicleRequest {
    pub vuid: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn vehicle_request_defaults_and_plate() {
        let request: VehicleRequest = serde_json::from_str(r#"{"vehicle_type_id": 1}"#).unwrap();
        assert_eq!(request.color, "FFFFFF");
        assert!(request.validate().is_ok());

        let request: VehicleRequest =
            serde_json::from_str(r#"{"vehicle_type_id": 1, "plate": "PBX-1234"}"#).unwrap();
        assert!(request.validate().is_ok());

        let request: VehicleRequest =
            serde_json::from_str(r#"{"vehicle_type_id": 1, "plate": "PBX1234"}"#).unwrap();
        assert_eq!(
            request.validate(),
            Err(ValidationError::InvalidVehiclePlate("PBX1234".to_string()))
        );
    }

    #[test]
    fn tire_request_flattens_item() {
        let request: TireRequest = serde_json::from_str(
            r#"{
                "manufacturing_code": "DOT-AB12-CD34-1223",
                "position_relative_to_vehicle": "Rear Left Inner",
                "registration_date": 1718445600,
                "cost": 120.5
            }"#,
        )
        .unwrap();
        assert_eq!(request.position_relative_to_vehicle, TirePosition::RearLeftInner);
        assert!(request.item.in_use);
        assert_eq!(request.item.cost, Some(120.5));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn tire_request_rejects_bad_dot_code() {
        let request: TireRequest = serde_json::from_str(
            r#"{
                "manufacturing_code": "DOT-AB12-CD34",
                "position_relative_to_vehicle": "Spare",
                "registration_date": 1718445600
            }"#,
        )
        .unwrap();
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidDotCode(_))
        ));
    }

    #[test]
    fn vehicle_type_year() {
        let mut request: VehicleTypeRequest = serde_json::from_str(
            r#"{"year": 2019, "brand": "Hino", "model": "300", "vehicle_type": "truck"}"#,
        )
        .unwrap();
        assert!(request.validate(today()).is_ok());
        request.year = 2030;
        assert!(request.validate(today()).is_err());
    }

    #[test]
    fn broker_info_dates() {
        let request = BrokerInfoRequest {
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: today(),
            insurance_company: "Seguros".to_string(),
            broker_name: "Broker".to_string(),
        };
        assert!(matches!(
            request.validate(today()),
            Err(ValidationError::InvalidExpiryDate(_))
        ));
    }

    #[test]
    fn mileage_units() {
        let request: MileageRequest =
            serde_json::from_str(r#"{"mileage": 1520.5, "unit": "km"}"#).unwrap();
        assert_eq!(request.unit, OdometerUnit::Kilometers);
        assert!(request.validate().is_ok());
        assert!(serde_json::from_str::<MileageRequest>(r#"{"mileage": 1, "unit": "parsec"}"#)
            .is_err());
    }
}
