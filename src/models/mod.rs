//! Typed settings consumed by the rest of the service.
pub mod config;
pub mod database;
