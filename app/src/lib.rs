// app/src/lib.rs

//! HTTP surface of the storefront backend: configuration, application state,
//! caller identity, rate limiting and the mapping of core errors to
//! responses.

pub mod config;
pub mod errors;
pub mod state;
pub mod web;

pub use config::AppConfig;
pub use errors::AppError;
pub use state::AppState;
