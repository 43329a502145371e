//! HTTP layer: axum routes, boundary validation, and error mapping for the
//! contract classification service.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{router, serve, AppState};
