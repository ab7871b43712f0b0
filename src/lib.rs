pub mod app;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod tasks;
pub mod telemetry;
