//! Minimal user slice carried by the coordination core.

use super::ids::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Passenger,
    Driver,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Passenger => "PASSENGER",
            UserRole::Driver => "DRIVER",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "DRIVER" => UserRole::Driver,
            "ADMIN" => UserRole::Admin,
            _ => UserRole::Passenger,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl User {
    /// "First Last" display form used in notifications.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
