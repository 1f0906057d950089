//! Driver licenses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{
    validate_expiry_date, validate_issue_date, validate_points, ValidationError,
};

string_enum! {
    /// License class: A motorcycles, B cars, C trucks, D buses, E articulated
    pub enum LicenseType ("license_type") {
        A => "A",
        B => "B",
        A1 => "A1",
        C => "C",
        C1 => "C1",
        D => "D",
        D1 => "D1",
        E => "E",
        E1 => "E1",
        F => "F",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct License {
    pub id: i64,
    pub driver_uuid: Uuid,
    #[sqlx(try_from = "String")]
    pub license_type: LicenseType,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub points: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LicenseRequest {
    /// Taken from the path on `/users/{uuid}/licenses`
    #[serde(default)]
    pub driver_uuid: Option<Uuid>,
    pub license_type: LicenseType,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub points: i32,
}

impl LicenseRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        validate_issue_date(self.issue_date, today)?;
        validate_expiry_date(self.expiry_date, today)?;
        validate_points(self.points)
    }

    pub fn driver(&self) -> Result<Uuid, ValidationError> {
        self.driver_uuid
            .ok_or(ValidationError::MissingField("driver_uuid"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(issue: NaiveDate, expiry: NaiveDate, points: i32) -> LicenseRequest {
        LicenseRequest {
            driver_uuid: Some(Uuid::nil()),
            license_type: LicenseType::C1,
            issue_date: issue,
            expiry_date: expiry,
            points,
        }
    }

    #[test]
    fn license_dates() {
        let today = date(2024, 6, 15);
        assert!(request(date(2020, 1, 1), date(2026, 1, 1), 12)
            .validate(today)
            .is_ok());
        assert_eq!(
            request(today, date(2026, 1, 1), 12).validate(today),
            Err(ValidationError::InvalidIssueDate(today))
        );
        assert_eq!(
            request(date(2020, 1, 1), today, 12).validate(today),
            Err(ValidationError::InvalidExpiryDate(today))
        );
        assert_eq!(
            request(date(2020, 1, 1), date(2026, 1, 1), 31).validate(today),
            Err(ValidationError::InvalidPoints(31))
        );
    }

    #[test]
    fn parse_license_type() {
        let request: LicenseRequest = serde_json::from_str(
            r#"{
                "license_type": "E1",
                "issue_date": "2020-01-01",
                "expiry_date": "2030-01-01",
                "points": 0
            }"#,
        )
        .unwrap();
        assert_eq!(request.license_type, LicenseType::E1);
        assert_eq!(
            request.driver(),
            Err(ValidationError::MissingField("driver_uuid"))
        );
    }
}
