//! Routes: ordered sequences of named positions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::round_coordinate;
use crate::validation::{
    validate_coordinates, validate_max_len, validate_not_blank, ValidationError,
};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Position {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionRequest {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl PositionRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("name", &self.name)?;
        validate_max_len("name", &self.name, 255)?;
        validate_coordinates(self.lat, self.lng)
    }

    /// Coordinates as stored, rounded so that equal positions compare equal
    pub fn rounded(&self) -> (f64, f64) {
        (round_coordinate(self.lat), round_coordinate(self.lng))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RouteRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("name", &self.name)?;
        validate_max_len("name", &self.name, 255)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteListQuery {
    pub name: Option<String>,
}

/// Position within a route
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RoutePosition {
    pub id: i64,
    pub route_id: i64,
    pub position_id: i64,
    /// One-based position in the route
    pub order: i32,
    pub alias: Option<String>,
    /// Distance to the next position in meters
    pub distance: Option<i64>,
    /// Estimated time to the next position in seconds
    pub estimated_time: Option<f64>,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutePositionRequest {
    pub position_id: i64,
    pub order: i32,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub distance: Option<i64>,
    #[serde(default)]
    pub estimated_time: Option<f64>,
}

impl RoutePositionRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order <= 0 {
            return Err(ValidationError::InvalidOrder);
        }
        if let Some(alias) = &self.alias {
            validate_max_len("alias", alias, 255)?;
        }
        if self.distance.is_some_and(|d| d < 0) {
            return Err(ValidationError::field("distance", "must not be negative"));
        }
        if self.estimated_time.is_some_and(|t| t < 0.0) {
            return Err(ValidationError::field(
                "estimated_time",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkRouteRequest {
    pub route_id: i64,
}

/// Route assigned to a user
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserRoute {
    pub user_uuid: Uuid,
    pub route_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_position_order_must_be_positive() {
        let request: RoutePositionRequest =
            serde_json::from_str(r#"{"position_id": 3, "order": 0}"#).unwrap();
        assert_eq!(request.validate(), Err(ValidationError::InvalidOrder));

        let request: RoutePositionRequest = serde_json::from_str(
            r#"{"position_id": 3, "order": 2, "alias": "depot", "distance": 1200}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn position_coordinates() {
        let request = PositionRequest {
            name: "Depot".to_string(),
            lat: 10.123456789,
            lng: -70.0,
        };
        assert!(request.validate().is_ok());
        assert_eq!(request.rounded(), (10.1234568, -70.0));

        let request = PositionRequest {
            name: "Nowhere".to_string(),
            lat: 91.0,
            lng: 0.0,
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidCoordinates { .. })
        ));
    }
}
