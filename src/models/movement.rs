//! Movement orders and their lifecycle log.
//!
//! An order is written once. Its progress is recorded by appending
//! [`MovementOrderState`] and [`Incident`] rows, and it is closed by a single
//! [`ClosureMovementOrder`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::unix_now;
use crate::validation::{validate_max_len, validate_not_blank, ValidationError};

/// Vehicle dispatch
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MovementOrder {
    pub id: Uuid,
    pub vehicle_vuid: Uuid,
    pub driver_uuid: Uuid,
    pub authorized_by: Uuid,
    /// Creation time in seconds from Unix epoch
    pub created_at: i64,
    /// Route followed by the vehicle
    pub itinerary_id: i64,
    /// Odometer reading at departure
    pub departure_mileage_id: i64,
    pub departure_details: String,
    pub departure_time_unix: i64,
    pub estimated_arrival_time_unix: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementOrderRequest {
    pub vehicle_vuid: Uuid,
    pub driver_uuid: Uuid,
    pub authorized_by: Uuid,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub itinerary_id: i64,
    pub departure_mileage_id: i64,
    pub departure_details: String,
    pub departure_time_unix: i64,
    #[serde(default)]
    pub estimated_arrival_time_unix: Option<i64>,
}

impl MovementOrderRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("departure_details", &self.departure_details)?;
        validate_max_len("departure_details", &self.departure_details, 1500)?;
        if self.departure_time_unix < 0 {
            return Err(ValidationError::field(
                "departure_time_unix",
                "must be a Unix timestamp",
            ));
        }
        if self
            .estimated_arrival_time_unix
            .is_some_and(|eta| eta < self.departure_time_unix)
        {
            return Err(ValidationError::field(
                "estimated_arrival_time_unix",
                "must not be before departure",
            ));
        }
        Ok(())
    }

    pub fn created_at(&self) -> i64 {
        self.created_at.unwrap_or_else(unix_now)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderQuery {
    pub order: Option<Uuid>,
}

/// Entry of the append-only state log
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MovementOrderState {
    pub id: Uuid,
    pub movement_order_id: Uuid,
    pub state: String,
    pub timestamp_unix: i64,
    pub set_by: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementOrderStateRequest {
    pub movement_order_id: Uuid,
    pub state: String,
    #[serde(default)]
    pub timestamp_unix: Option<i64>,
    pub set_by: Uuid,
}

impl MovementOrderStateRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("state", &self.state)?;
        validate_max_len("state", &self.state, 200)
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp_unix.unwrap_or_else(unix_now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Incident {
    pub id: Uuid,
    pub movement_order_id: Uuid,
    pub description: String,
    pub incident_time_unix: i64,
    pub reported_by: Uuid,
    pub resolved: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncidentRequest {
    pub movement_order_id: Uuid,
    pub description: String,
    #[serde(default)]
    pub incident_time_unix: Option<i64>,
    pub reported_by: Uuid,
    #[serde(default)]
    pub resolved: bool,
}

impl IncidentRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("description", &self.description)?;
        validate_max_len("description", &self.description, 2000)
    }

    pub fn incident_time(&self) -> i64 {
        self.incident_time_unix.unwrap_or_else(unix_now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ClosureMovementOrder {
    pub id: Uuid,
    pub movement_order_id: Uuid,
    pub verified_by: Uuid,
    pub confirmation_time: i64,
    /// Odometer reading at arrival
    pub arrival_mileage_id: i64,
    pub arrival_time_unix: i64,
    /// Whether the order was complied with
    pub compliance: bool,
    pub extra_details: String,
    pub had_incident: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClosureRequest {
    pub movement_order_id: Uuid,
    pub verified_by: Uuid,
    #[serde(default)]
    pub confirmation_time: Option<i64>,
    pub arrival_mileage_id: i64,
    pub arrival_time_unix: i64,
    pub compliance: bool,
    #[serde(default)]
    pub extra_details: String,
    #[serde(default)]
    pub had_incident: bool,
}

impl ClosureRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_max_len("extra_details", &self.extra_details, 1500)?;
        if self.arrival_time_unix < 0 {
            return Err(ValidationError::field(
                "arrival_time_unix",
                "must be a Unix timestamp",
            ));
        }
        Ok(())
    }

    pub fn confirmation_time(&self) -> i64 {
        self.confirmation_time.unwrap_or_else(unix_now)
    }
}

/// Order together with everything logged against it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementOrderTimeline {
    pub order: MovementOrder,
    pub states: Vec<MovementOrderState>,
    pub incidents: Vec<Incident>,
    pub closure: Option<ClosureMovementOrder>,
    /// Name of the most recently logged state
    pub latest_state: Option<String>,
    /// Incidents not yet resolved
    pub open_incidents: usize,
    pub closed: bool,
}

impl MovementOrderTimeline {
    /// Build a timeline, ordering the log by time
    pub fn new(
        order: MovementOrder,
        mut states: Vec<MovementOrderState>,
        mut incidents: Vec<Incident>,
        closure: Option<ClosureMovementOrder>,
    ) -> Self {
        // Stable sort keeps insertion order for equal timestamps
        states.sort_by_key(|s| s.timestamp_unix);
        incidents.sort_by_key(|i| i.incident_time_unix);
        let latest_state = states.last().map(|s| s.state.clone());
        let open_incidents = incidents.iter().filter(|i| !i.resolved).count();
        let closed = closure.is_some();
        Self {
            order,
            states,
            incidents,
            closure,
            latest_state,
            open_incidents,
            closed,
        }
    }
}
