//! Domain layer: core business logic, models, and port contracts.

pub mod models;
pub mod ports;
