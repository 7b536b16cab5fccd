//! HTTP routes for odontolegal

pub mod auth_routes;
pub mod health;
pub mod response;
pub mod signatures;

pub use auth_routes::handle_auth_request;
pub use health::{health_check, version_info};
pub use response::{cors_preflight, not_found, BoxBody};
pub use signatures::{handle_api_request, handle_public_verify};
