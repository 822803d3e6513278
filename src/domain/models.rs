use crate::time_utils::{self, DisplayZone};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub enum RoleCode {
    Resident,
    Subcontractor,
    Admin,
}

impl RoleCode {
    pub fn code(self) -> i64 {
        match self {
            RoleCode::Resident => 1,
            RoleCode::Subcontractor => 2,
            RoleCode::Admin => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoleCode::Resident => "resident",
            RoleCode::Subcontractor => "subcontractor",
            RoleCode::Admin => "admin",
        }
    }
}

impl TryFrom<i64> for RoleCode {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RoleCode::Resident),
            2 => Ok(RoleCode::Subcontractor),
            3 => Ok(RoleCode::Admin),
            other => Err(format!("unknown roleCode {other}")),
        }
    }
}

impl From<RoleCode> for i64 {
    fn from(role: RoleCode) -> Self {
        role.code()
    }
}

/// Authenticated identity plus bearer token, as returned by `POST /auth`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role_code: RoleCode,
    #[serde(default)]
    pub building_id: Option<i64>,
    #[serde(default)]
    pub block_id: Option<i64>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub access_token: String,
}

impl Session {
    pub fn has_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: i64,
    pub name: String,
}

/// Task status. A missing or empty status reads as `Pending`; anything the
/// client does not recognise is kept verbatim in `Other`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Other(String),
}

impl TaskStatus {
    pub const KNOWN: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn label(&self) -> &str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TaskStatus::Other(_))
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | "Pending" => TaskStatus::Pending,
            "In Progress" => TaskStatus::InProgress,
            "Completed" => TaskStatus::Completed,
            other => TaskStatus::Other(other.to_string()),
        }
    }
}

impl From<Option<String>> for TaskStatus {
    fn from(raw: Option<String>) -> Self {
        raw.map(|s| TaskStatus::parse(&s)).unwrap_or_default()
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTask {
    pub id: i64,
    pub task: String,
    pub building_id: i64,
    pub block_id: i64,
    #[serde(default)]
    pub subcontractor: Option<i64>,
    pub category: i64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub due_to: String,
    #[serde(rename = "created_at", default)]
    pub created_at: String,
}

impl MaintenanceTask {
    /// Due date as wall time in `zone`.
    pub fn due_at(&self, zone: &DisplayZone) -> Option<NaiveDateTime> {
        time_utils::parse_iso(&self.due_to, zone)
    }
}

/// A user as listed in the dashboard snapshot. Role-specific fields live on
/// the matching `UserRole` variant only.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "UserRecord", into = "UserRecord")]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub building_id: Option<i64>,
    pub role: UserRole,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UserRole {
    Resident {
        unit: Option<String>,
        block_id: Option<i64>,
        approved_by: Option<i64>,
    },
    Subcontractor {
        company_name: Option<String>,
        service_type: Option<i64>,
        phone: Option<String>,
    },
    Admin,
}

impl UserRole {
    pub fn code(&self) -> RoleCode {
        match self {
            UserRole::Resident { .. } => RoleCode::Resident,
            UserRole::Subcontractor { .. } => RoleCode::Subcontractor,
            UserRole::Admin => RoleCode::Admin,
        }
    }
}

impl User {
    pub fn is_approved(&self) -> bool {
        match &self.role {
            UserRole::Resident { approved_by, .. } => approved_by.is_some(),
            _ => true,
        }
    }
}

/// Flat wire shape of a user; every role-specific column is nullable.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    id: i64,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    role_code: i64,
    #[serde(default)]
    building_id: Option<i64>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    block_id: Option<i64>,
    #[serde(default)]
    approved_by: Option<i64>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    service_type: Option<i64>,
    #[serde(default)]
    phone: Option<String>,
}

impl TryFrom<UserRecord> for User {
    type Error = String;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let role = match RoleCode::try_from(record.role_code)? {
            RoleCode::Resident => UserRole::Resident {
                unit: record.unit,
                block_id: record.block_id,
                approved_by: record.approved_by,
            },
            RoleCode::Subcontractor => UserRole::Subcontractor {
                company_name: record.company_name,
                service_type: record.service_type,
                phone: record.phone,
            },
            RoleCode::Admin => UserRole::Admin,
        };
        Ok(User {
            id: record.id,
            full_name: record.full_name,
            email: record.email,
            building_id: record.building_id,
            role,
        })
    }
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        let mut record = UserRecord {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role_code: user.role.code().code(),
            building_id: user.building_id,
            ..UserRecord::default()
        };
        match user.role {
            UserRole::Resident {
                unit,
                block_id,
                approved_by,
            } => {
                record.unit = unit;
                record.block_id = block_id;
                record.approved_by = approved_by;
            }
            UserRole::Subcontractor {
                company_name,
                service_type,
                phone,
            } => {
                record.company_name = company_name;
                record.service_type = service_type;
                record.phone = phone;
            }
            UserRole::Admin => {}
        }
        record
    }
}

/// Role-scoped copy of server-side entities shared by every dashboard view.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceTask>,
}

/// Public building/block listing used by the sign-up flow.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BuildingDirectory {
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl BuildingDirectory {
    pub fn blocks_for(&self, building_id: i64) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .filter(move |block| block.building_id == building_id)
    }
}

/// `{ success, result?, message? }` envelope returned by admin endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}
