//! Wiring of one on-disk gymdesk instance.
//!
//! # Responsibility
//! - Open the slot database named by `CoreConfig`.
//! - Share one store and one event bus across every service.
//!
//! # Invariants
//! - Store and auth gate use separate connections to the same file.
//! - Services handed out here all observe the same documents.

use crate::auth::directory::StaticDirectory;
use crate::auth::gate::AuthGate;
use crate::config::{ConfigError, CoreConfig};
use crate::event::{EventBus, SharedNotifier};
use crate::service::billing_service::BillingService;
use crate::service::catalog_service::CatalogService;
use crate::service::member_dashboard::MemberDashboard;
use crate::service::member_service::MemberService;
use crate::service::notification_service::NotificationService;
use crate::service::report_service::ReportService;
use crate::service::user_dashboard::UserDashboard;
use crate::storage::{SlotError, SqliteSlotStorage};
use crate::store::{RecordStore, StoreError, StoreOptions};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Store handle every service receives.
pub type SharedStore = Arc<RecordStore<SqliteSlotStorage>>;

pub type SharedAuthGate = AuthGate<StaticDirectory, SqliteSlotStorage>;

#[derive(Debug)]
pub enum ContextError {
    Config(ConfigError),
    Io(std::io::Error),
    Storage(SlotError),
    Store(StoreError),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "failed to prepare data directory: {err}"),
            Self::Storage(err) => write!(f, "failed to open slot database: {err}"),
            Self::Store(err) => write!(f, "failed to open record store: {err}"),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ContextError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<std::io::Error> for ContextError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SlotError> for ContextError {
    fn from(value: SlotError) -> Self {
        Self::Storage(value)
    }
}

impl From<StoreError> for ContextError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub struct CoreContext {
    config: CoreConfig,
    store: SharedStore,
    events: Arc<EventBus>,
    auth: SharedAuthGate,
}

impl CoreContext {
    /// Opens (and migrates) the database under `config.data_dir`.
    ///
    /// Does not start logging; see `CoreConfig::start_logging`.
    pub fn open(config: &CoreConfig) -> Result<Self, ContextError> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;
        let database_path = config.database_path();

        let events = Arc::new(EventBus::new());
        let notifier: SharedNotifier = events.clone();

        let store = RecordStore::open(
            SqliteSlotStorage::open(&database_path)?,
            StoreOptions {
                slot_key: config.data_slot.clone(),
                seed_defaults: config.seed_defaults,
            },
            notifier.clone(),
        )?;
        let auth = AuthGate::with_slot(
            StaticDirectory::demo(),
            SqliteSlotStorage::open(&database_path)?,
            config.session_slot.clone(),
            notifier,
        );

        info!(
            "event=context_open module=core status=ok database={}",
            database_path.display()
        );
        Ok(Self {
            config: config.clone(),
            store: Arc::new(store),
            events,
            auth,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Bus receiving record, payment, profile and auth events.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn auth(&self) -> &SharedAuthGate {
        &self.auth
    }

    pub fn members(&self) -> MemberService<SharedStore> {
        MemberService::new(self.store.clone())
    }

    pub fn billing(&self) -> BillingService<SharedStore> {
        BillingService::new(self.store.clone(), self.notifier())
    }

    pub fn notifications(&self) -> NotificationService<SharedStore> {
        NotificationService::new(self.store.clone())
    }

    pub fn reports(&self) -> ReportService<SharedStore> {
        ReportService::new(self.store.clone())
    }

    pub fn catalog(&self) -> CatalogService<SharedStore> {
        CatalogService::new(self.store.clone())
    }

    pub fn member_dashboard(&self) -> MemberDashboard<SharedStore> {
        MemberDashboard::new(self.store.clone(), self.notifier())
    }

    pub fn user_dashboard(&self) -> UserDashboard<SharedStore> {
        UserDashboard::new(self.store.clone())
    }

    fn notifier(&self) -> SharedNotifier {
        self.events.clone()
    }
}
