use crate::domain::forms::ResidentForm;
use crate::domain::models::BuildingDirectory;
use crate::error::Result;
use crate::session::{RequestAttempt, SessionManager};
use std::sync::Arc;

/// Public endpoints used before sign-in: the building picker and resident
/// self-registration.
#[derive(Clone)]
pub struct DirectoryService {
    session: Arc<SessionManager>,
}

impl DirectoryService {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub async fn list_buildings(&self) -> Result<BuildingDirectory> {
        let directory: BuildingDirectory = self.session.get_json("/buildings").await?;
        tracing::debug!(
            "Loaded {} buildings and {} blocks",
            directory.buildings.len(),
            directory.blocks.len()
        );
        Ok(directory)
    }

    /// Creates a resident account pending admin approval.
    pub async fn register_resident(&self, form: &ResidentForm) -> Result<()> {
        form.validate(false)?;
        let attempt = RequestAttempt::post("/register/user", &form.payload())?;
        self.session.send(attempt).await?;
        tracing::info!("Registration submitted for {}", form.email);
        Ok(())
    }
}
