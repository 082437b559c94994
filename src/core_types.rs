//! Core type definitions shared across the ledger core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account identifier (BIGSERIAL in PostgreSQL)
pub type AccountId = i64;

/// Caller role, supplied by the upstream auth middleware.
///
/// The ledger core trusts this value; it only enforces the admin gate on
/// review and adjustment operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
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
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Authenticated principal for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: AccountId,
    pub role: Role,
}

impl Actor {
    pub fn user(id: AccountId) -> Self {
        Self {
            id,
            role: Role::User,
        }
    }

    pub fn admin(id: AccountId) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_is_admin() {
        assert!(Actor::admin(1).role.is_admin());
        assert!(!Actor::user(1).role.is_admin());
    }
}
