//! Field validators shared by the request types.
//!
//! Date based checks take `today` explicitly so callers decide the clock.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is not a valid vehicle plate")]
    InvalidVehiclePlate(String),

    #[error("{0} is not a valid DOT code")]
    InvalidDotCode(String),

    #[error("{0} is not a valid battery code")]
    InvalidBatteryCode(String),

    #[error("The manufacture year {0} is outside the defined limits")]
    InvalidManufactureYear(i32),

    #[error("{0} is not a valid date. The issue date cannot be in the future")]
    InvalidIssueDate(NaiveDate),

    #[error("{0} is not a valid date. The expiry date must be in the future")]
    InvalidExpiryDate(NaiveDate),

    #[error("{0} is not a valid hexadecimal color")]
    InvalidColor(String),

    #[error("{0} is not a valid maintenance frequency")]
    InvalidFrequency(String),

    #[error("Points must be between 0 and 30, got {0}")]
    InvalidPoints(i32),

    #[error("Invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("Latitude and longitude must be given together")]
    IncompleteCoordinates,

    #[error("The order must be a positive number")]
    InvalidOrder,

    #[error("The order is already used in this route")]
    DuplicateRouteOrder,

    #[error("The route already has a position at these coordinates")]
    DuplicateRoutePosition,

    #[error("Invalid value for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("{0} is required")]
    MissingField(&'static str),
}

impl ValidationError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            message: message.into(),
        }
    }
}

static VEHICLE_PLATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}-\d{3,4}$").unwrap());
static MOTORCYCLE_PLATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}-\d{3}[A-Z]?$").unwrap());
static DOT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DOT-[A-Z0-9]{4}-[A-Z0-9]{4}-\d{4}$").unwrap());
static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{6}$").unwrap());

// distance: 120km, 5000mi, 30hm, 2dam, or "-"; time: 6m, 1y, 250h, or "-"
const DISTANCE: &str = r"(\d+(([hkn]?|da)m(i)?)|-)";
const TIME: &str = r"(\d{1,4}(h|d|w|m|y)|-)";
static FREQUENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^{DISTANCE},{DISTANCE},{TIME}$")).unwrap());

/// Checks the plate format only, `ABC-123`, `ABC-1234` or `AB-123[C]`
pub fn is_valid_vehicle_plate(plate: &str) -> bool {
    VEHICLE_PLATE.is_match(plate) || MOTORCYCLE_PLATE.is_match(plate)
}

pub fn validate_vehicle_plate(plate: &str) -> Result<(), ValidationError> {
    if !is_valid_vehicle_plate(plate) {
        return Err(ValidationError::InvalidVehiclePlate(plate.to_string()));
    }
    Ok(())
}

/// Tire DOT code, `DOT-XXXX-XXXX-DDDD` with X an uppercase letter or digit
pub fn is_valid_dot_code(dot_code: &str) -> bool {
    DOT_CODE.is_match(dot_code)
}

pub fn validate_dot_code(dot_code: &str) -> Result<(), ValidationError> {
    if !is_valid_dot_code(dot_code) {
        return Err(ValidationError::InvalidDotCode(dot_code.to_string()));
    }
    Ok(())
}

/// At least 8 ASCII alphanumerics, with at least one letter and one digit
pub fn is_valid_battery_code(code: &str) -> bool {
    code.len() >= 8
        && code.chars().all(|c| c.is_ascii_alphanumeric())
        && code.chars().any(|c| c.is_ascii_alphabetic())
        && code.chars().any(|c| c.is_ascii_digit())
}

pub fn validate_battery_code(code: &str) -> Result<(), ValidationError> {
    if !is_valid_battery_code(code) {
        return Err(ValidationError::InvalidBatteryCode(code.to_string()));
    }
    Ok(())
}

pub fn validate_manufacture_year(year: i32, today: NaiveDate) -> Result<(), ValidationError> {
    if year <= 1900 || year > today.year() {
        return Err(ValidationError::InvalidManufactureYear(year));
    }
    Ok(())
}

/// The issue date must be strictly in the past
pub fn validate_issue_date(issue_date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if issue_date >= today {
        return Err(ValidationError::InvalidIssueDate(issue_date));
    }
    Ok(())
}

/// The expiry date must be strictly in the future
pub fn validate_expiry_date(
    expiry_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if expiry_date <= today {
        return Err(ValidationError::InvalidExpiryDate(expiry_date));
    }
    Ok(())
}

pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    if !HEX_COLOR.is_match(color) {
        return Err(ValidationError::InvalidColor(color.to_string()));
    }
    Ok(())
}

/// Maintenance frequency triple `distance,distance,time`
pub fn validate_frequency(frequency: &str) -> Result<(), ValidationError> {
    if !FREQUENCY.is_match(frequency) {
        return Err(ValidationError::InvalidFrequency(frequency.to_string()));
    }
    Ok(())
}

pub fn validate_points(points: i32) -> Result<(), ValidationError> {
    if !(0..=30).contains(&points) {
        return Err(ValidationError::InvalidPoints(points));
    }
    Ok(())
}

pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(ValidationError::InvalidCoordinates { lat, lng });
    }
    Ok(())
}

/// Both or neither coordinate must be present
pub fn validate_optional_coordinates(
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<(), ValidationError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => validate_coordinates(lat, lng),
        (None, None) => Ok(()),
        _ => Err(ValidationError::IncompleteCoordinates),
    }
}

pub fn validate_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

pub fn validate_max_len(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::field(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::field(field, "must be a non-negative number"));
    }
    Ok(())
}
