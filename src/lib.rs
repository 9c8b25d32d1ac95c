//! Inventory REST API: product catalog, stock reports and role-gated
//! accounts over MongoDB.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;
pub mod uploads;

pub use error::ApiError;
pub use routes::{configure, AppServices};
