//! User document schema
//!
//! Stores login credentials and the role that decides who may sign.

use bson::oid::ObjectId;
use mongodb::IndexModel;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::{ascending_index, MongoSchema};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    /// Login identifier
    pub email: String,

    #[serde(default)]
    pub role: Role,

    /// Argon2 password hash
    pub password_hash: String,

    /// Whether the user account is active
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl UserDoc {
    /// Create a new user document
    pub fn new(name: String, email: String, role: Role, password_hash: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            email,
            role,
            password_hash,
            is_active: true,
        }
    }

    /// User id as hex string
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

impl MongoSchema for UserDoc {
    const COLLECTION: &'static str = USER_COLLECTION;

    fn indexes() -> Vec<IndexModel> {
        vec![ascending_index("email", "email_unique", true)]
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
