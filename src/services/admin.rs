//! Admin write operations. Each call validates its form, sends the request,
//! and splices the server's canonical record into the dashboard snapshot.

use crate::domain::forms::{MaintenanceForm, ResidentForm, SubcontractorForm};
use crate::domain::models::{ApiEnvelope, MaintenanceTask, Session, User};
use crate::error::{ClientError, Result};
use crate::services::dashboard::DashboardCache;
use crate::session::{RequestAttempt, SessionManager};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewSubcontractor<'a> {
    #[serde(flatten)]
    form: &'a SubcontractorForm,
    user_id: i64,
    building_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Approval {
    user_id: i64,
    approved_by: i64,
}

impl<T> ApiEnvelope<T> {
    /// `success: false` becomes `Rejected`; a success without a body also
    /// counts as a rejection since there is nothing to patch in.
    fn into_record(self) -> Result<T> {
        match (self.success, self.result) {
            (true, Some(record)) => Ok(record),
            _ => Err(ClientError::Rejected {
                message: self.message,
            }),
        }
    }

    fn into_ack(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(ClientError::Rejected {
                message: self.message,
            })
        }
    }
}

#[derive(Clone)]
pub struct AdminService {
    session: Arc<SessionManager>,
    cache: Arc<DashboardCache>,
}

impl AdminService {
    pub fn new(session: Arc<SessionManager>, cache: Arc<DashboardCache>) -> Self {
        Self { session, cache }
    }

    async fn acting(&self) -> Result<Session> {
        self.session.current().await.ok_or(ClientError::NotAuthenticated)
    }

    async fn call<T: DeserializeOwned>(&self, attempt: RequestAttempt) -> Result<ApiEnvelope<T>> {
        self.session.send_json(attempt).await
    }

    pub async fn add_subcontractor(&self, form: &SubcontractorForm) -> Result<User> {
        form.validate(false)?;
        let admin = self.acting().await?;
        let body = NewSubcontractor {
            form,
            user_id: admin.id,
            building_id: admin.building_id,
        };
        let user = self
            .call::<User>(RequestAttempt::post("/admin/addSub", &body)?)
            .await?
            .into_record()?;
        tracing::info!("Subcontractor {} added by admin {}", user.id, admin.id);
        self.cache.upsert_user(user.clone()).await;
        Ok(user)
    }

    pub async fn update_subcontractor(&self, id: i64, form: &SubcontractorForm) -> Result<User> {
        form.validate(true)?;
        let user = self
            .call::<User>(RequestAttempt::put(format!("/admin/updateSub/{id}"), form)?)
            .await?
            .into_record()?;
        self.cache.upsert_user(user.clone()).await;
        Ok(user)
    }

    pub async fn add_maintenance(&self, form: &MaintenanceForm) -> Result<MaintenanceTask> {
        form.validate()?;
        let task = self
            .call::<MaintenanceTask>(RequestAttempt::post("/admin/addMaintenance", form)?)
            .await?
            .into_record()?;
        tracing::info!("Maintenance task {} created", task.id);
        self.cache.upsert_maintenance(task.clone()).await;
        Ok(task)
    }

    pub async fn update_maintenance(&self, id: i64, form: &MaintenanceForm) -> Result<MaintenanceTask> {
        form.validate()?;
        let task = self
            .call::<MaintenanceTask>(RequestAttempt::put(
                format!("/admin/updateMaintenance/{id}"),
                form,
            )?)
            .await?
            .into_record()?;
        self.cache.upsert_maintenance(task.clone()).await;
        Ok(task)
    }

    pub async fn delete_maintenance(&self, id: i64) -> Result<()> {
        self.call::<serde_json::Value>(RequestAttempt::delete(format!("/admin/deleteMaintenance/{id}")))
            .await?
            .into_ack()?;
        tracing::info!("Maintenance task {} deleted", id);
        self.cache.remove_maintenance(id).await;
        Ok(())
    }

    pub async fn update_user(&self, id: i64, form: &ResidentForm) -> Result<User> {
        form.validate(true)?;
        let user = self
            .call::<User>(RequestAttempt::put(format!("/admin/updateUser/{id}"), &form.payload())?)
            .await?
            .into_record()?;
        self.cache.upsert_user(user.clone()).await;
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.call::<serde_json::Value>(RequestAttempt::delete(format!("/admin/deleteUser/{id}")))
            .await?
            .into_ack()?;
        tracing::info!("User {} deleted", id);
        self.cache.remove_user(id).await;
        Ok(())
    }

    /// Approves a pending resident on behalf of the signed-in admin.
    pub async fn approve_user(&self, user_id: i64) -> Result<()> {
        let admin = self.acting().await?;
        let body = Approval {
            user_id,
            approved_by: admin.id,
        };
        self.call::<serde_json::Value>(RequestAttempt::post("/admin/approveUser", &body)?)
            .await?
            .into_ack()?;
        tracing::info!("User {} approved by admin {}", user_id, admin.id);
        self.cache.mark_user_approved(user_id, admin.id).await;
        Ok(())
    }
}
