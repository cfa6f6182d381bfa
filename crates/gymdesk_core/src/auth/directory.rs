//! Pluggable credential verification.

use super::permission::Role;

/// Identity returned by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Source of truth for credential pairs.
pub trait CredentialDirectory {
    /// Returns the matching identity, or `None` for any mismatch.
    fn verify(&self, email: &str, password: &str) -> Option<Identity>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CredentialEntry {
    email: String,
    password: String,
    identity: Identity,
}

/// Fixed in-memory credential table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: Vec<CredentialEntry>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
        role: Role,
        name: impl Into<String>,
    ) -> Self {
        let email = email.into();
        self.entries.push(CredentialEntry {
            email: email.clone(),
            password: password.into(),
            identity: Identity {
                email,
                name: name.into(),
                role,
            },
        });
        self
    }

    /// Demo accounts, one per role.
    pub fn demo() -> Self {
        Self::new()
            .with_account("jhanvi@gmail.com", "admin123", Role::Admin, "Jhanvi Singh")
            .with_account("member@gmail.com", "member123", Role::Member, "Krishna Sharma")
            .with_account("user@gmail.com", "user123", Role::User, "Regular User")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialDirectory for StaticDirectory {
    fn verify(&self, email: &str, password: &str) -> Option<Identity> {
        self.entries
            .iter()
            .find(|entry| entry.email == email && entry.password == password)
            .map(|entry| entry.identity.clone())
    }
}
