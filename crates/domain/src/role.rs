//! Roles and users: who is asking.

use serde::{Deserialize, Serialize};

use crate::error::{HomeError, ValidationError};

/// Permission tier of a [`User`].
///
/// No total order is implied: `Admin` bypasses every check, while `User`
/// and `Guest` each get their own kind-specific allowances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::User => f.write_str("user"),
            Self::Guest => f.write_str("guest"),
        }
    }
}

/// A person interacting with the hub. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    name: String,
    role: Role,
}

impl User {
    /// Create a user, rejecting blank names.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is empty or
    /// whitespace-only.
    pub fn new(name: impl Into<String>, role: Role) -> Result<Self, HomeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Self { name, role })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_user_when_name_provided() {
        let user = User::new("alice", Role::Admin).unwrap();
        assert_eq!(user.name(), "alice");
        assert_eq!(user.role(), Role::Admin);
    }

    #[test]
    fn should_reject_user_when_name_is_blank() {
        let result = User::new("   ", Role::Guest);
        assert!(matches!(
            result,
            Err(HomeError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_serialize_role_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Guest).unwrap(), "\"guest\"");
    }
}
