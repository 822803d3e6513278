use crate::domain::models::{DashboardSnapshot, MaintenanceTask, RoleCode, User};
use crate::error::Result;
use crate::session::{AuthPhase, SessionManager};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Loaded,
    /// Another refresh was already outstanding; no request was sent.
    InFlight,
    NoSession,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardQuery {
    id: i64,
    role_code: RoleCode,
    building_id: Option<i64>,
}

/// Resets the in-flight flag however the fetch ends.
struct FetchGuard<'a>(&'a AtomicBool);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// In-memory snapshot shared by every dashboard view.
pub struct DashboardCache {
    session: Arc<SessionManager>,
    snapshot: RwLock<Option<DashboardSnapshot>>,
    fetching: AtomicBool,
}

impl DashboardCache {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            snapshot: RwLock::new(None),
            fetching: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Fetches the role-scoped snapshot. Any failure clears the snapshot and
    /// signs the user out before the error is returned.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Some(session) = self.session.current().await else {
            return Ok(RefreshOutcome::NoSession);
        };
        if self
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Dashboard refresh already in flight, skipping");
            return Ok(RefreshOutcome::InFlight);
        }
        let _guard = FetchGuard(&self.fetching);

        let query = DashboardQuery {
            id: session.id,
            role_code: session.role_code,
            building_id: session.building_id,
        };
        match self
            .session
            .post_json::<_, DashboardSnapshot>("/dashboard", &query)
            .await
        {
            Ok(snapshot) => {
                tracing::info!(
                    "Dashboard loaded for user {}: {} users, {} blocks, {} tasks",
                    session.id,
                    snapshot.users.len(),
                    snapshot.blocks.len(),
                    snapshot.maintenance.len()
                );
                *self.snapshot.write().await = Some(snapshot);
                Ok(RefreshOutcome::Loaded)
            }
            Err(e) => {
                tracing::error!("Failed to fetch dashboard data: {}", e);
                *self.snapshot.write().await = None;
                self.session.logout().await;
                Err(e)
            }
        }
    }

    /// Follows the session state: loads once per sign-in, clears on sign-out.
    /// Token refreshes do not trigger a reload.
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let mut rx = cache.session.subscribe();
        tokio::spawn(async move {
            let mut loaded_generation = None;
            loop {
                let phase = *rx.borrow_and_update();
                cache.on_phase(phase, &mut loaded_generation).await;
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    async fn on_phase(&self, phase: AuthPhase, loaded_generation: &mut Option<u64>) {
        match phase {
            AuthPhase::Authenticated { generation } if *loaded_generation != Some(generation) => {
                *loaded_generation = Some(generation);
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Initial dashboard load failed: {}", e);
                }
            }
            AuthPhase::Authenticated { .. } => {}
            AuthPhase::Anonymous => {
                *loaded_generation = None;
                self.clear().await;
            }
        }
    }

    pub async fn snapshot(&self) -> Option<DashboardSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Borrows the snapshot for the duration of `f`.
    pub async fn read<R>(&self, f: impl FnOnce(Option<&DashboardSnapshot>) -> R) -> R {
        let guard = self.snapshot.read().await;
        f(guard.as_ref())
    }

    pub async fn set(&self, snapshot: Option<DashboardSnapshot>) {
        *self.snapshot.write().await = snapshot;
    }

    pub async fn clear(&self) {
        self.set(None).await;
    }

    /// Applies `f` to the snapshot if one is loaded. Returns whether it ran.
    pub async fn update(&self, f: impl FnOnce(&mut DashboardSnapshot)) -> bool {
        let mut guard = self.snapshot.write().await;
        match guard.as_mut() {
            Some(snapshot) => {
                f(snapshot);
                true
            }
            None => false,
        }
    }

    pub async fn upsert_maintenance(&self, task: MaintenanceTask) -> bool {
        self.update(|s| s.upsert_maintenance(task)).await
    }

    pub async fn remove_maintenance(&self, id: i64) -> bool {
        let mut removed = false;
        self.update(|s| removed = s.remove_maintenance(id)).await;
        removed
    }

    pub async fn upsert_user(&self, user: User) -> bool {
        self.update(|s| s.upsert_user(user)).await
    }

    pub async fn remove_user(&self, id: i64) -> bool {
        let mut removed = false;
        self.update(|s| removed = s.remove_user(id)).await;
        removed
    }

    pub async fn mark_user_approved(&self, id: i64, approver: i64) -> bool {
        let mut marked = false;
        self.update(|s| marked = s.mark_user_approved(id, approver)).await;
        marked
    }
}
