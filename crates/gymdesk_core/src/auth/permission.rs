//! Role, resource and action vocabulary plus the permission matrix.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Who the authenticated identity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    /// Permission matrix.
    ///
    /// - admin: everything.
    /// - member: read and update their own profile scope (member record,
    ///   bills, notifications) and read the catalog; never create.
    /// - user: read the catalog, own profile and search; read and update
    ///   their own account record.
    pub fn permits(self, action: Action, resource: Resource) -> bool {
        match self {
            Self::Admin => true,
            Self::Member => match action {
                Action::Read => matches!(resource, Resource::Profile | Resource::Catalog),
                Action::Update => resource == Resource::Profile,
                Action::Create | Action::Delete => false,
            },
            Self::User => match action {
                Action::Read => matches!(
                    resource,
                    Resource::Catalog | Resource::Profile | Resource::Search | Resource::Account
                ),
                Action::Update => resource == Resource::Account,
                Action::Create | Action::Delete => false,
            },
        }
    }
}

/// Area of the system an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Members,
    Bills,
    FeePackages,
    Notifications,
    Reports,
    /// Supplements and diet plans.
    Catalog,
    /// The caller's own member record, bills and notifications.
    Profile,
    Search,
    /// The caller's own entry in the `users` collection.
    Account,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Bills => "bills",
            Self::FeePackages => "fee_packages",
            Self::Notifications => "notifications",
            Self::Reports => "reports",
            Self::Catalog => "catalog",
            Self::Profile => "profile",
            Self::Search => "search",
            Self::Account => "account",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Raised when a role lacks a permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub role: Role,
    pub action: Action,
    pub resource: Resource,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "role `{}` may not {} {}",
            self.role.as_str(),
            self.action.as_str(),
            self.resource.as_str()
        )
    }
}

impl Error for AccessDenied {}

#[cfg(test)]
mod tests {
    use super::{Action, Resource, Role};

    #[test]
    fn parses_known_roles_only() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" member "), Some(Role::Member));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("Admin"), None);
    }

    #[test]
    fn admin_may_do_everything() {
        for resource in [Resource::Members, Resource::Bills, Resource::Reports] {
            for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
                assert!(Role::Admin.permits(action, resource));
            }
        }
    }

    #[test]
    fn member_never_creates() {
        for resource in [Resource::Bills, Resource::Notifications, Resource::Profile] {
            assert!(!Role::Member.permits(Action::Create, resource));
        }
        assert!(Role::Member.permits(Action::Read, Resource::Profile));
        assert!(Role::Member.permits(Action::Update, Resource::Profile));
        assert!(!Role::Member.permits(Action::Read, Resource::Bills));
        assert!(!Role::Member.permits(Action::Read, Resource::Members));
        assert!(!Role::Member.permits(Action::Read, Resource::Reports));
    }

    #[test]
    fn user_only_edits_their_account() {
        assert!(Role::User.permits(Action::Read, Resource::Search));
        assert!(Role::User.permits(Action::Read, Resource::Catalog));
        assert!(!Role::User.permits(Action::Update, Resource::Profile));
        assert!(!Role::User.permits(Action::Read, Resource::Bills));
        assert!(Role::User.permits(Action::Update, Resource::Account));
        assert!(!Role::User.permits(Action::Delete, Resource::Account));
        assert!(!Role::Member.permits(Action::Read, Resource::Account));
    }
}
