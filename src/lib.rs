pub mod audit;
pub mod auth;
pub mod configuration;
pub mod error;
pub mod identity;
pub mod logger;
pub mod middleware;
pub mod rbac;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod tugas;
pub mod validators;
