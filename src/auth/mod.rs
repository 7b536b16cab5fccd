//! Authentication and authorization for odontolegal
//!
//! Provides:
//! - JWT session token generation and validation
//! - Role model deciding who may sign and verify reports
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{bearer_token, Claims, JwtValidator, SessionToken, TokenInput};
pub use password::{hash_password, verify_password};
pub use permissions::Role;
