//! Fleet management backend
//!
//! REST API over PostgreSQL for GPS tracker alarms, vehicles, drivers,
//! routes, movement orders and maintenance.

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod filters;
pub mod geocoding;
pub mod ingest;
pub mod models;
pub mod validation;
