//! The caller on whose behalf an attendance operation runs.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;

/// School role carried by the upstream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Preceptor,
    Teacher,
    Student,
    Guardian,
}

impl Role {
    /// Roles allowed to create, edit and delete attendance records.
    pub fn can_manage_attendance(&self) -> bool {
        matches!(self, Role::Administrator | Role::Preceptor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Preceptor => "preceptor",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Guardian => "guardian",
        }
    }
}

/// Role token handed over by the authorization layer.
///
/// Authorization itself happens upstream; the core only refuses to mutate
/// when no managing role is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actor {
    pub role: Option<Role>,
}

impl Actor {
    pub fn new(role: Role) -> Self {
        Self { role: Some(role) }
    }

    /// An actor without any role token.
    pub fn anonymous() -> Self {
        Self { role: None }
    }

    /// Fails closed unless the actor holds a managing role.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Permission`] when the role is missing or read-only.
    pub fn ensure_can_manage(&self) -> Result<(), AppError> {
        match self.role {
            Some(role) if role.can_manage_attendance() => Ok(()),
            Some(role) => Err(AppError::permission_denied(
                "Role is not allowed to modify attendance",
                json!({ "role": role.as_str() }),
            )),
            None => Err(AppError::permission_denied(
                "A managing role is required to modify attendance",
                json!({ "role": null }),
            )),
        }
    }
}
