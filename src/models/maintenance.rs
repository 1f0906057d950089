//! Maintenance manuals and the operations they schedule.
//!
//! Frequencies are written `distance,distance,time`, each component either a
//! quantity with unit (`5000km`, `6m`) or `-` when not applicable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{
    validate_frequency, validate_max_len, validate_not_blank, ValidationError,
};

string_enum! {
    pub enum Task ("task") {
        /// Inspect and correct or replace if necessary
        Inspect => "I",
        Adjust => "A",
        /// Replace or change
        Replace => "R",
        /// Tighten to specified torque
        Torque => "T",
        Lubricate => "L",
        Clean => "C",
        Check => "CK",
        Test => "TS",
        Service => "SV",
    }
}

const NO_FREQUENCY: &str = "-,-,-";

fn default_frequency() -> String {
    NO_FREQUENCY.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MaintenanceManual {
    pub id: i64,
    pub vehicle_vuid: Uuid,
    pub start_date: NaiveDate,
    pub advance_alerts: String,
    pub minimum_frequency: String,
    pub end_of_cycle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceManualRequest {
    pub vehicle_vuid: Uuid,
    pub start_date: NaiveDate,
    #[serde(default = "default_frequency")]
    pub advance_alerts: String,
    #[serde(default = "default_frequency")]
    pub minimum_frequency: String,
    #[serde(default = "default_frequency")]
    pub end_of_cycle: String,
}

impl MaintenanceManualRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for frequency in [
            &self.advance_alerts,
            &self.minimum_frequency,
            &self.end_of_cycle,
        ] {
            validate_frequency(frequency)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MaintenanceOperation {
    pub id: i64,
    pub maintenance_manual_id: i64,
    pub system: String,
    pub subsystem: String,
    #[sqlx(try_from = "String")]
    pub task: Task,
    pub description: String,
    pub frequency: String,
    pub help_me: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceOperationRequest {
    pub maintenance_manual_id: i64,
    pub system: String,
    pub subsystem: String,
    pub task: Task,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_frequency")]
    pub frequency: String,
    #[serde(default)]
    pub help_me: String,
}

impl MaintenanceOperationRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("system", &self.system)?;
        validate_max_len("system", &self.system, 50)?;
        validate_not_blank("subsystem", &self.subsystem)?;
        validate_max_len("subsystem", &self.subsystem, 50)?;
        validate_frequency(&self.frequency)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualQuery {
    pub vehicle: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationQuery {
    pub manual: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_defaults_to_no_frequency() {
        let request: MaintenanceManualRequest = serde_json::from_value(serde_json::json!({
            "vehicle_vuid": Uuid::nil(),
            "start_date": "2024-01-01"
        }))
        .unwrap();
        assert_eq!(request.end_of_cycle, "-,-,-");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn operation_frequency() {
        let mut request: MaintenanceOperationRequest = serde_json::from_str(
            r#"{
                "maintenance_manual_id": 1,
                "system": "Engine",
                "subsystem": "Oil",
                "task": "R",
                "frequency": "5000km,-,6m"
            }"#,
        )
        .unwrap();
        assert_eq!(request.task, Task::Replace);
        assert!(request.validate().is_ok());

        request.frequency = "5000km,6m".to_string();
        assert_eq!(
            request.validate(),
            Err(ValidationError::InvalidFrequency("5000km,6m".to_string()))
        );
    }

    #[test]
    fn task_codes() {
        assert_eq!("CK".parse::<Task>().unwrap(), Task::Check);
        assert_eq!(Task::Service.as_str(), "SV");
        assert!("X".parse::<Task>().is_err());
    }
}
