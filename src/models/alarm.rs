//! Tracker alarms.

use serde::{Deserialize, Serialize};

use crate::models::Imei;
use crate::validation::{validate_max_len, validate_optional_coordinates, ValidationError};

string_enum! {
    /// Alarm codes reported by the tracking providers
    pub enum AlarmCode ("alarm_code") {
        /// Ignition off, vehicle stopped
        AccOff => "ACCOFF",
        /// Ignition on
        AccOn => "ACCON",
        OfflineTimeout => "OFFLINETIMEOUT",
        StayTimeout => "STAYTIMEOUT",
        /// Dismantling, light sensor, power failure, plug in or out
        Remove => "REMOVE",
        LowVoltage => "LOWVOT",
        /// Second charge
        Erya => "ERYA",
        FenceIn => "FENCEIN",
        FenceOut => "FENCEOUT",
        Separated => "SEP",
        Sos => "SOS",
        Overspeed => "OVERSPEED",
        /// Abnormal permanent residence at home
        Home => "HOME",
        /// Abnormal permanent residence at the company
        Company => "COMPANY",
        Crash => "CRASH",
        Shake => "SHAKE",
        Acceleration => "ACCELERATION",
        Deceleration => "DECELERATION",
        Turn => "TURN",
        FastAcceleration => "FASTACCELERATION",
        SharpTurn => "SHARPTURN",
        Turnover => "TURNOVER",
        FastDeceleration => "FASTDECELERATION",
        RemoveContinuously => "REMOVECONTINUOUSLY",
        Shift => "SHIFT",
        AreaOut => "AREAOUT",
        AreaIn => "AREAIN",
        ExternalLowBattery => "EXTERNALLOWBATTERY",
        /// Signal jamming
        SignalJamming => "XINHAOPINBI",
        PseudoBaseStation => "PSEUDOBASESTATION",
        Online => "ONLINE",
        AbnormalAccumulation => "ABNORMALACCUMULATION",
        RiskPlace => "RISKPLACE",
        VinMismatch => "VINMISMATCH",
        ShortMiles => "SHORTMILES",
        LongMiles => "LONGMILES",
        Trail => "TRAIL",
        Multiplayer => "MULTIPLAYER",
        OpenCover => "OPENCOVER",
        PowerOn => "POWERON",
        PowerOff => "POWEROFF",
        Magnetism => "MAGNETISM",
        Bluetooth => "BLUETOOTH",
        Unknown => "UNKNOWN",
        Driving => "DRIVING",
        DrivingByMe => "DRIVINGBYME",
        Stopped => "STOPPED",
        StoppedByMe => "STOPPEDBYME",
        AuxiliaryActivities => "AUXILIARYACTIVITIES",
        Sleeping => "SLEEPING",
        ExceptionalCases => "EXCEPTIONALCASES",
    }
}

/// Stored alarm
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Alarm {
    pub id: i64,
    pub device_imei: String,
    /// Latitude in WGS84 decimal degrees
    pub lat: Option<f64>,
    /// Longitude in WGS84 decimal degrees
    pub lng: Option<f64>,
    /// Alarm timestamp in seconds from Unix epoch
    pub time: i64,
    /// Reverse geocoded address, filled in after the fact
    pub address: Option<String>,
    #[sqlx(try_from = "String")]
    pub alarm_code: AlarmCode,
    pub alarm_type: i32,
    /// Course in degrees
    pub course: Option<i32>,
    pub device_type: i32,
    pub position_type: Option<String>,
    /// Speed in km/h
    pub speed: Option<i32>,
}

impl Alarm {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lng)
    }

    pub fn has_address(&self) -> bool {
        self.address
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty())
    }
}

/// Alarm as reported by a tracker
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAlarm {
    pub device_imei: Imei,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub time: i64,
    #[serde(default)]
    pub address: Option<String>,
    pub alarm_code: AlarmCode,
    pub alarm_type: i32,
    #[serde(default)]
    pub course: Option<i32>,
    pub device_type: i32,
    #[serde(default)]
    pub position_type: Option<String>,
    #[serde(default)]
    pub speed: Option<i32>,
}

impl NewAlarm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_optional_coordinates(self.lat, self.lng)?;
        if self.time < 0 {
            return Err(ValidationError::field("time", "must be a Unix timestamp"));
        }
        if let Some(position_type) = &self.position_type {
            validate_max_len("position_type", position_type, 20)?;
        }
        Ok(())
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lng)
    }

    pub fn has_address(&self) -> bool {
        self.address
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_codes_round_trip_through_text() {
        assert_eq!(AlarmCode::ALL.len(), 51);
        for code in AlarmCode::ALL {
            assert_eq!(code.as_str().parse::<AlarmCode>().unwrap(), *code);
        }
        assert_eq!("XINHAOPINBI".parse::<AlarmCode>().unwrap(), AlarmCode::SignalJamming);
        assert!("accoff".parse::<AlarmCode>().is_err());
    }

    #[test]
    fn parse_new_alarm() {
        let s = r#"{
            "device_imei": "869066062080357",
            "lat": 10.0,
            "lng": -70.0,
            "time": 1718445600,
            "alarm_code": "OVERSPEED",
            "alarm_type": 3,
            "course": 180,
            "device_type": 1,
            "speed": 97
        }"#;
        let alarm: NewAlarm = serde_json::from_str(s).unwrap();
        assert_eq!(alarm.device_imei.as_str(), "869066062080357");
        assert_eq!(alarm.alarm_code, AlarmCode::Overspeed);
        assert_eq!(alarm.coordinates(), Some((10.0, -70.0)));
        assert_eq!(alarm.address, None);
        assert!(alarm.validate().is_ok());
    }

    #[test]
    fn reject_unknown_alarm_code() {
        let s = r#"{
            "device_imei": "869066062080357",
            "time": 1718445600,
            "alarm_code": "NOPE",
            "alarm_type": 3,
            "device_type": 1
        }"#;
        assert!(serde_json::from_str::<NewAlarm>(s).is_err());
    }

    #[test]
    fn validate_half_coordinates() {
        let s = r#"{
            "device_imei": "869066062080357",
            "lat": 10.0,
            "time": 1718445600,
            "alarm_code": "SOS",
            "alarm_type": 3,
            "device_type": 1
        }"#;
        let alarm: NewAlarm = serde_json::from_str(s).unwrap();
        assert_eq!(
            alarm.validate(),
            Err(ValidationError::IncompleteCoordinates)
        );
    }

    #[test]
    fn blank_address_counts_as_missing() {
        let s = r#"{
            "device_imei": "1",
            "time": 0,
            "address": "  ",
            "alarm_code": "SOS",
            "alarm_type": 0,
            "device_type": 0
        }"#;
        let alarm: NewAlarm = serde_json::from_str(s).unwrap();
        assert!(!alarm.has_address());
    }
}
