//! Core domain logic for gymdesk, a gym administration record store.
//! Every business rule (validation, permissions, reports) lives here.

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod event;
pub mod logging;
pub mod model;
pub mod seed;
pub mod service;
pub mod storage;
pub mod store;

pub use auth::directory::{CredentialDirectory, Identity, StaticDirectory};
pub use auth::gate::{AuthError, AuthGate};
pub use auth::permission::{AccessDenied, Action, Resource, Role};
pub use auth::session::Session;
pub use config::{ConfigError, CoreConfig};
pub use context::{ContextError, CoreContext, SharedStore};
pub use event::{Event, EventBus, EventLog, Notifier, RecordEventKind, SharedNotifier};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Document, DocumentId, Fields};
pub use service::{ServiceError, ServiceResult};
pub use storage::{MemorySlotStorage, SlotError, SlotStorage, SqliteSlotStorage};
pub use store::{
    Condition, DocumentStore, Filter, Operator, PersistenceError, RecordStore, StoreError,
    StoreOptions, StoreResult,
};
