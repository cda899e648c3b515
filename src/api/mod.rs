//! REST API boundary.

mod handlers;
mod rest;

pub use handlers::ApiState;
pub use rest::{create_rest_router, serve, RestApiConfig};
