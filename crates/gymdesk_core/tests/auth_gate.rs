use gymdesk_core::auth::gate::DEFAULT_SESSION_SLOT;
use gymdesk_core::event::{noop_notifier, EventBus, EventLog};
use gymdesk_core::{
    Action, AuthError, AuthGate, CredentialDirectory, MemorySlotStorage, Resource, Role, Session,
    SlotStorage, SqliteSlotStorage, StaticDirectory,
};
use std::sync::Arc;

fn demo_gate() -> AuthGate<StaticDirectory, MemorySlotStorage> {
    AuthGate::new(StaticDirectory::demo(), MemorySlotStorage::new(), noop_notifier())
}

#[test]
fn demo_directory_has_one_account_per_role() {
    let directory = StaticDirectory::demo();
    assert_eq!(directory.len(), 3);
    assert_eq!(
        directory.verify("member@gmail.com", "member123").unwrap().role,
        Role::Member
    );
    assert!(directory.verify("member@gmail.com", "admin123").is_none());
}

#[test]
fn login_stores_session_and_restores_it() {
    let gate = demo_gate();
    let session = gate.login(" jhanvi@gmail.com ", "admin123").unwrap();
    assert_eq!(
        session,
        Session::new("jhanvi@gmail.com", "Jhanvi Singh", Role::Admin)
    );
    assert!(gate.is_authenticated());
    assert_eq!(gate.current_session(), Some(session));
}

#[test]
fn wrong_password_is_invalid_and_stores_nothing() {
    let gate = demo_gate();
    let err = gate.login("jhanvi@gmail.com", "wrong").unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(gate.current_session().is_none());
}

#[test]
fn blank_credentials_are_rejected_before_lookup() {
    let gate = demo_gate();
    assert!(matches!(
        gate.login("  ", "admin123").unwrap_err(),
        AuthError::MissingCredentials
    ));
    assert!(matches!(
        gate.login("jhanvi@gmail.com", "").unwrap_err(),
        AuthError::MissingCredentials
    ));
}

#[test]
fn logout_clears_session_and_is_idempotent() {
    let gate = demo_gate();
    gate.login("user@gmail.com", "user123").unwrap();
    gate.logout().unwrap();
    assert!(!gate.is_authenticated());
    gate.logout().unwrap();
}

#[test]
fn auth_events_reach_subscribers() {
    let bus = Arc::new(EventBus::new());
    let log = EventLog::new();
    log.attach(&bus);
    let gate = AuthGate::new(StaticDirectory::demo(), MemorySlotStorage::new(), bus);

    gate.login("member@gmail.com", "member123").unwrap();
    let _ = gate.login("member@gmail.com", "nope");
    gate.logout().unwrap();
    gate.logout().unwrap();

    assert_eq!(log.names(), vec!["signed_in", "signed_out"]);
}

#[test]
fn malformed_session_slot_reads_as_signed_out() {
    let storage = MemorySlotStorage::new().with_slot(DEFAULT_SESSION_SLOT, "{\"email\":");
    let gate = AuthGate::new(StaticDirectory::demo(), storage, noop_notifier());
    assert!(gate.current_session().is_none());
}

#[test]
fn session_survives_in_sqlite_slot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gymdesk.sqlite3");

    {
        let gate = AuthGate::with_slot(
            StaticDirectory::demo(),
            SqliteSlotStorage::open(&path).unwrap(),
            "session",
            noop_notifier(),
        );
        gate.login("user@gmail.com", "user123").unwrap();
    }

    let storage = SqliteSlotStorage::open(&path).unwrap();
    assert!(storage.load("session").unwrap().is_some());
    let gate = AuthGate::with_slot(StaticDirectory::demo(), storage, "session", noop_notifier());
    assert_eq!(gate.current_session().unwrap().role, Role::User);
}

#[test]
fn custom_directory_plugs_in() {
    let directory = StaticDirectory::new().with_account(
        "coach@gym.com",
        "whistle",
        Role::Member,
        "Coach",
    );
    let gate = AuthGate::new(directory, MemorySlotStorage::new(), noop_notifier());
    assert_eq!(gate.login("coach@gym.com", "whistle").unwrap().name, "Coach");
    assert!(gate.login("jhanvi@gmail.com", "admin123").is_err());
}

#[test]
fn roles_follow_the_permission_matrix() {
    let admin = Session::new("a@gym.com", "A", Role::Admin);
    let member = Session::new("m@gym.com", "M", Role::Member);
    let user = Session::new("u@gym.com", "U", Role::User);

    assert!(admin.require(Action::Delete, Resource::Members).is_ok());
    assert!(member.require(Action::Read, Resource::Profile).is_ok());
    assert!(member.require(Action::Update, Resource::Profile).is_ok());
    assert!(member.require(Action::Create, Resource::Bills).is_err());
    assert!(member.require(Action::Read, Resource::Members).is_err());
    assert!(user.require(Action::Read, Resource::Search).is_ok());
    assert!(user.require(Action::Update, Resource::Profile).is_err());

    let denied = user.require(Action::Create, Resource::Catalog).unwrap_err();
    assert_eq!(denied.role, Role::User);
    assert_eq!(denied.action, Action::Create);
    assert_eq!(denied.resource, Resource::Catalog);
}
