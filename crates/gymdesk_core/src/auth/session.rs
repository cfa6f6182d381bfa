//! Authenticated identity held for the duration of a session.

use super::permission::{AccessDenied, Action, Resource, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Session {
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `AccessDenied` unless this session's role permits the
    /// action.
    pub fn require(&self, action: Action, resource: Resource) -> Result<(), AccessDenied> {
        if self.role.permits(action, resource) {
            return Ok(());
        }
        log::warn!(
            "event=access_denied module=auth role={} action={} resource={}",
            self.role.as_str(),
            action.as_str(),
            resource.as_str()
        );
        Err(AccessDenied {
            role: self.role,
            action,
            resource,
        })
    }
}
