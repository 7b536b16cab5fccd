//! HTTP server for odontolegal

pub mod http;

pub use http::{run, AppState};
