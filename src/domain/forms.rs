use crate::domain::models::{MaintenanceTask, TaskStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Client-side form rejection. Raised before any request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{title}: {description}")]
pub struct ValidationError {
    pub title: &'static str,
    pub description: &'static str,
}

impl ValidationError {
    const fn new(title: &'static str, description: &'static str) -> Self {
        Self { title, description }
    }
}

const INVALID_EMAIL: ValidationError =
    ValidationError::new("Invalid email", "Please enter a valid email address.");

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_valid_email(&self.email) {
            return Err(INVALID_EMAIL);
        }
        if self.password.is_empty() {
            return Err(ValidationError::new(
                "Password required",
                "Please enter your password.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceForm {
    pub task: String,
    pub building_id: i64,
    pub block_id: Option<i64>,
    pub subcontractor: Option<i64>,
    pub category: Option<i64>,
    pub status: String,
    pub comment: String,
    pub due_to: String,
}

impl MaintenanceForm {
    pub fn new(building_id: i64) -> Self {
        Self {
            building_id,
            status: TaskStatus::Pending.label().to_string(),
            ..Self::default()
        }
    }

    /// Pre-fills the form from an existing task. The building always comes
    /// from the acting admin's session.
    pub fn from_task(task: &MaintenanceTask, building_id: i64) -> Self {
        Self {
            task: task.task.clone(),
            building_id,
            block_id: Some(task.block_id),
            subcontractor: task.subcontractor,
            category: Some(task.category),
            status: task.status.label().to_string(),
            comment: task.comment.clone().unwrap_or_default(),
            due_to: task.due_to.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.task.trim().is_empty() {
            return Err(ValidationError::new(
                "Task required",
                "Please enter a maintenance task.",
            ));
        }
        if self.block_id.is_none() {
            return Err(ValidationError::new("Block required", "Please select a block."));
        }
        if self.category.is_none() {
            return Err(ValidationError::new(
                "Category required",
                "Please select a category.",
            ));
        }
        if !TaskStatus::parse(&self.status).is_known() || self.status.is_empty() {
            return Err(ValidationError::new(
                "Invalid status",
                "Please select a valid status.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcontractorForm {
    pub full_name: String,
    pub company_name: String,
    pub phone: String,
    pub email: String,
    pub service_type: Option<i64>,
    /// Required when adding; left empty on update to keep the current one.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
}

impl SubcontractorForm {
    pub fn validate(&self, editing: bool) -> Result<(), ValidationError> {
        if !is_valid_email(&self.email) {
            return Err(INVALID_EMAIL);
        }
        if self.service_type.is_none() {
            return Err(ValidationError::new(
                "Category required",
                "Please select a category.",
            ));
        }
        if !editing && self.password.is_empty() {
            return Err(ValidationError::new(
                "Password required",
                "Please enter a password.",
            ));
        }
        Ok(())
    }
}

/// Resident sign-up form, also used by admins editing a resident.
#[derive(Debug, Clone, Default)]
pub struct ResidentForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub building_id: Option<i64>,
    pub block_id: Option<i64>,
    pub unit: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResidentPayload<'a> {
    full_name: &'a str,
    email: &'a str,
    building_id: Option<i64>,
    block_id: Option<i64>,
    unit: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    password: &'a str,
}

impl ResidentForm {
    pub fn validate(&self, editing: bool) -> Result<(), ValidationError> {
        if self.full_name.is_empty() || self.email.is_empty() || self.unit.is_empty() {
            return Err(ValidationError::new(
                "Missing fields",
                "Please fill out all required fields.",
            ));
        }
        if !is_valid_email(&self.email) {
            return Err(INVALID_EMAIL);
        }
        if !editing && (self.password.is_empty() || self.password != self.confirm_password) {
            return Err(ValidationError::new("Password issue", "Passwords must match."));
        }
        Ok(())
    }

    pub(crate) fn payload(&self) -> ResidentPayload<'_> {
        ResidentPayload {
            full_name: &self.full_name,
            email: &self.email,
            building_id: self.building_id,
            block_id: self.block_id,
            unit: &self.unit,
            password: &self.password,
        }
    }
}
