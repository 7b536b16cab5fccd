//! Roles and what they are allowed to do with signatures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including signing
    Admin,
    /// Forensic examiner; author and signer of reports
    Perito,
    /// Assistant; may read and verify but never sign
    #[default]
    Assistente,
}

impl Role {
    /// Whether this role may sign reports and evidence reports
    pub fn can_sign(&self) -> bool {
        matches!(self, Role::Admin | Role::Perito)
    }

    /// Whether this role may run the authenticated signature check
    pub fn can_verify(&self) -> bool {
        true
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Perito => "perito",
            Role::Assistente => "assistente",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "perito" => Ok(Role::Perito),
            "assistente" => Ok(Role::Assistente),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}
