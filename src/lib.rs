pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod session;

use std::sync::Arc;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
pub use config::Settings;

pub use api::{DashboardApi, ReportsApi, UsersApi};
pub use client::ApiClient;
pub use session::{AuthStatus, FileStorage, MemoryStorage, Session, TokenPair, TokenStorage};

/// Console handle shared by everything that issues requests.
///
/// One session object is the single source of truth for the current
/// credentials; the resource APIs all route through one client built on
/// it. Lifecycle: [`Console::init`] once at startup, [`Console::teardown`]
/// when the operator logs out.
pub struct Console {
    pub session: Arc<Session>,
    pub reports: ReportsApi,
    pub users: UsersApi,
    pub dashboard: DashboardApi,
}

impl Console {
    /// Build a console persisting its session at the configured path.
    pub fn new(settings: &Settings) -> Result<Self> {
        let storage = FileStorage::new(&settings.session.storage_path);
        Self::with_storage(settings, Box::new(storage))
    }

    /// Build a console over a specific storage backend.
    pub fn with_storage(settings: &Settings, storage: Box<dyn TokenStorage>) -> Result<Self> {
        let session = Arc::new(Session::new(settings, storage)?);
        let client = Arc::new(ApiClient::new(settings, session.clone())?);

        Ok(Self {
            session,
            reports: ReportsApi::new(client.clone()),
            users: UsersApi::new(client.clone()),
            dashboard: DashboardApi::new(client),
        })
    }

    /// Load the persisted session, resolving the bootstrap "unknown"
    /// auth state.
    pub async fn init(&self) -> Result<()> {
        self.session.load().await
    }

    /// Log out and drop the stored credentials.
    pub async fn teardown(&self) -> Result<()> {
        self.session.logout().await
    }
}
