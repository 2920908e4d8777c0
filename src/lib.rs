pub mod cancel;
pub mod config;
pub mod db;
pub mod error;
pub mod period;
pub mod routes;
pub mod subscriptions;
pub mod telemetry;
