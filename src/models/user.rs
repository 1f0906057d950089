//! Users: drivers, dispatchers, managers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{validate_max_len, validate_not_blank, ValidationError};

string_enum! {
    pub enum Role ("roles") {
        Superuser => "Superuser",
        Admin => "Admin",
        Driver => "Driver",
        TransportManager => "TransportManager",
        Secretary => "Secretary",
        Dispatcher => "Dispatcher",
        Maintenance => "Maintenance",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub uuid: Uuid,
    pub username: String,
    pub id_card: Option<String>,
    pub roles: Vec<String>,
    /// Accounts this user is a child of
    pub parent_accounts: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRequest {
    pub username: String,
    #[serde(default)]
    pub id_card: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub parent_accounts: Vec<Uuid>,
}

impl UserRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_blank("username", &self.username)?;
        validate_max_len("username", &self.username, 150)?;
        if let Some(id_card) = &self.id_card {
            validate_max_len("id_card", id_card, 13)?;
        }
        Ok(())
    }

    /// Parent accounts without duplicates, never including `own`
    pub fn parents_of(&self, own: Uuid) -> Result<Vec<Uuid>, ValidationError> {
        if self.parent_accounts.contains(&own) {
            return Err(ValidationError::field(
                "parent_accounts",
                "a user cannot be its own parent",
            ));
        }
        let mut parents = self.parent_accounts.clone();
        parents.sort();
        parents.dedup();
        Ok(parents)
    }

    pub fn role_names(&self) -> Vec<String> {
        let mut roles: Vec<String> = self.roles.iter().map(|r| r.as_str().to_string()).collect();
        roles.sort();
        roles.dedup();
        roles
    }
}
