use crate::config::ClientConfig;
use crate::error::Result;
use crate::services::admin::AdminService;
use crate::services::dashboard::DashboardCache;
use crate::services::directory::DirectoryService;
use crate::session::{FileSessionStorage, SessionManager, SessionStorage};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The two stores plus the services built on them, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
    pub dashboard: Arc<DashboardCache>,
    pub admin: AdminService,
    pub directory: DirectoryService,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let session = Arc::new(SessionManager::new(config, storage)?);
        let dashboard = Arc::new(DashboardCache::new(session.clone()));
        Ok(Self {
            admin: AdminService::new(session.clone(), dashboard.clone()),
            directory: DirectoryService::new(session.clone()),
            session,
            dashboard,
        })
    }

    /// Persists the session to `config.session_file`.
    pub fn from_config(config: ClientConfig) -> Result<SharedState> {
        let storage = Arc::new(FileSessionStorage::new(config.session_file.clone()));
        Ok(Arc::new(Self::new(config, storage)?))
    }

    /// Restores a persisted session and starts the snapshot watcher, which
    /// loads the dashboard for a restored session straight away.
    pub async fn start(&self) -> Result<JoinHandle<()>> {
        self.session.restore().await?;
        Ok(self.dashboard.watch_session())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStorage;
    use crate::test_support::{admin_session, MockBackend};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_loads_restored_session() {
        let backend = MockBackend::start().await;
        let storage = Arc::new(MemorySessionStorage::with_session(admin_session()));
        let state = AppState::new(ClientConfig::new(&backend.base_url), storage).unwrap();

        let handle = state.start().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while state.dashboard.snapshot().await.is_none() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("snapshot not loaded");
        assert_eq!(backend.state.dashboard_calls.load(Ordering::SeqCst), 1);
        handle.abort();
    }

    #[tokio::test]
    async fn test_start_without_session_stays_empty() {
        let backend = MockBackend::start().await;
        let state = AppState::new(
            ClientConfig::new(&backend.base_url),
            Arc::new(MemorySessionStorage::new()),
        )
        .unwrap();
        let handle = state.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(state.dashboard.snapshot().await.is_none());
        assert_eq!(backend.state.dashboard_calls.load(Ordering::SeqCst), 0);
        handle.abort();
    }
}
