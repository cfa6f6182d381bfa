//! Login/logout against a credential directory with a persisted session.
//!
//! # Invariants
//! - At most one session is stored, under `session_slot`.
//! - Credentials are never logged; only the role of a successful login is.

use super::directory::CredentialDirectory;
use super::session::Session;
use crate::event::{Event, SharedNotifier};
use crate::storage::{SlotError, SlotStorage};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

/// Default slot name holding the current session.
pub const DEFAULT_SESSION_SLOT: &str = "currentUser";

#[derive(Debug)]
pub enum AuthError {
    /// Email or password was empty.
    MissingCredentials,
    /// No directory entry matched the pair.
    InvalidCredentials,
    /// Session slot could not be written or cleared.
    Persistence(SlotError),
    Encode(serde_json::Error),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "email and password are required"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Persistence(err) => write!(f, "session persistence failure: {err}"),
            Self::Encode(err) => write!(f, "failed to encode session: {err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::MissingCredentials | Self::InvalidCredentials => None,
        }
    }
}

impl From<SlotError> for AuthError {
    fn from(value: SlotError) -> Self {
        Self::Persistence(value)
    }
}

/// Authentication gate over a credential directory and a session slot.
pub struct AuthGate<D: CredentialDirectory, S: SlotStorage> {
    directory: D,
    storage: Mutex<S>,
    session_slot: String,
    notifier: SharedNotifier,
}

impl<D: CredentialDirectory, S: SlotStorage> AuthGate<D, S> {
    pub fn new(directory: D, storage: S, notifier: SharedNotifier) -> Self {
        Self::with_slot(directory, storage, DEFAULT_SESSION_SLOT, notifier)
    }

    pub fn with_slot(
        directory: D,
        storage: S,
        session_slot: impl Into<String>,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            directory,
            storage: Mutex::new(storage),
            session_slot: session_slot.into(),
            notifier,
        }
    }

    /// Verifies the pair and stores the resulting session.
    ///
    /// # Errors
    /// - `MissingCredentials` when either value is blank.
    /// - `InvalidCredentials` when the directory has no match; nothing is
    ///   stored in that case.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let Some(identity) = self.directory.verify(email, password) else {
            warn!("event=auth_login module=auth status=error error_code=invalid_credentials");
            return Err(AuthError::InvalidCredentials);
        };

        let session = Session::new(identity.email, identity.name, identity.role);
        let payload = serde_json::to_string(&session).map_err(AuthError::Encode)?;
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .save(&self.session_slot, &payload)?;

        info!(
            "event=auth_login module=auth status=ok role={}",
            session.role.as_str()
        );
        self.notifier.publish(&Event::SignedIn {
            session: session.clone(),
        });
        Ok(session)
    }

    /// Clears the stored session. Logging out without a session is a no-op.
    pub fn logout(&self) -> Result<(), AuthError> {
        let previous = self.current_session();
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_slot)?;

        if let Some(session) = previous {
            info!("event=auth_logout module=auth status=ok");
            self.notifier.publish(&Event::SignedOut {
                email: session.email,
            });
        }
        Ok(())
    }

    /// Session restored from the slot, if any.
    ///
    /// An unreadable or malformed slot reads as signed out.
    pub fn current_session(&self) -> Option<Session> {
        let loaded = self
            .storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .load(&self.session_slot);
        match loaded {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(session) => Some(session),
                Err(err) => {
                    warn!("event=auth_restore module=auth status=error error_code=decode_failed error={err}");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!("event=auth_restore module=auth status=error error_code=slot_failed error={err}");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }
}
