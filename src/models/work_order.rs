//! Work orders.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::unix_now;
use crate::validation::{validate_max_len, validate_not_blank, ValidationError};

string_enum! {
    pub enum CompletionStatus ("status") {
        Pending => "pending",
        Completed => "completed",
        NotCompleted => "not_completed",
    }
}

impl Default for CompletionStatus {
    fn default() -> Self {
        CompletionStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WorkOrder {
    pub id: i64,
    pub responsible: Uuid,
    pub created_by: Uuid,
    pub vehicle_vuid: Uuid,
    pub issue_date_unix: i64,
    pub maintenance_type: String,
    pub work_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkOrderRequest {
    pub responsible: Uuid,
    pub created_by: Uuid,
    pub vehicle_vuid: Uuid,
    #[serde(default)]
    pub issue_date_unix: Option<i64>,
    pub maintenance_type: String,
    pub work_type: String,
}

impl WorkOrderRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("maintenance_type", &self.maintenance_type)?;
        validate_max_len("maintenance_type", &self.maintenance_type, 255)?;
        validate_not_blank("work_type", &self.work_type)
    }

    pub fn issue_date(&self) -> i64 {
        self.issue_date_unix.unwrap_or_else(unix_now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WorkOrderCompletion {
    pub id: i64,
    pub work_order_id: i64,
    #[sqlx(try_from = "String")]
    pub status: CompletionStatus,
    pub change_registered_by: Uuid,
    pub change_date_unix: i64,
    pub responsible_notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkOrderCompletionRequest {
    #[serde(default)]
    pub status: CompletionStatus,
    pub change_registered_by: Uuid,
    #[serde(default)]
    pub change_date_unix: Option<i64>,
    #[serde(default)]
    pub responsible_notes: String,
}

impl WorkOrderCompletionRequest {
    pub fn change_date(&self) -> i64 {
        self.change_date_unix.unwrap_or_else(unix_now)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkOrderQuery {
    pub vehicle: Option<Uuid>,
}
