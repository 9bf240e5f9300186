//! Core data types shared by the server and the portal

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Every portal and every protected route belongs to exactly one.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrative dashboard users
    Admin,
    /// Buyers browsing and ordering through the frontend
    Buyer,
    /// Labour accounts offering work through the frontend
    Labour,
}

impl Role {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Buyer => "buyer",
            Role::Labour => "labour",
        }
    }

    /// Whether an account with this role may be created through public sign-up
    pub fn is_self_registrable(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "buyer" => Ok(Role::Buyer),
            "labour" => Ok(Role::Labour),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Profile attributes editable by the account owner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}
