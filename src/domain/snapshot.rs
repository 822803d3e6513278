//! Lookups and by-id patches over a [`DashboardSnapshot`].
//!
//! References inside maintenance tasks are resolved against the snapshot's own
//! arrays. A dangling reference resolves to `"Unknown"` (or `"None"` for a
//! missing subcontractor) instead of failing.

use crate::domain::models::{DashboardSnapshot, MaintenanceTask, RoleCode, User, UserRole};

pub const UNKNOWN: &str = "Unknown";
pub const NO_SUBCONTRACTOR: &str = "None";

impl DashboardSnapshot {
    pub fn building_name(&self, id: i64) -> &str {
        self.buildings
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.name.as_str())
            .unwrap_or(UNKNOWN)
    }

    pub fn block_name(&self, id: i64) -> &str {
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.name.as_str())
            .unwrap_or(UNKNOWN)
    }

    pub fn service_name(&self, id: i64) -> &str {
        self.services
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
            .unwrap_or(UNKNOWN)
    }

    pub fn subcontractor_name(&self, id: Option<i64>) -> &str {
        id.and_then(|id| self.users.iter().find(|u| u.id == id))
            .map(|u| u.full_name.as_str())
            .unwrap_or(NO_SUBCONTRACTOR)
    }

    pub fn users_with_role(&self, role: RoleCode) -> impl Iterator<Item = &User> {
        self.users.iter().filter(move |u| u.role.code() == role)
    }

    pub fn residents(&self) -> impl Iterator<Item = &User> {
        self.users_with_role(RoleCode::Resident)
    }

    pub fn subcontractors(&self) -> impl Iterator<Item = &User> {
        self.users_with_role(RoleCode::Subcontractor)
    }

    /// Subcontractors offering the given service; the maintenance form only
    /// lets an admin assign one of these.
    pub fn subcontractors_for_service(&self, service_id: i64) -> impl Iterator<Item = &User> {
        self.subcontractors().filter(move |u| {
            matches!(u.role, UserRole::Subcontractor { service_type: Some(s), .. } if s == service_id)
        })
    }

    /// Tasks assigned to one subcontractor.
    pub fn assigned_tasks(&self, user_id: i64) -> impl Iterator<Item = &MaintenanceTask> {
        self.maintenance
            .iter()
            .filter(move |t| t.subcontractor == Some(user_id))
    }

    pub fn upsert_maintenance(&mut self, task: MaintenanceTask) {
        match self.maintenance.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.maintenance.push(task),
        }
    }

    pub fn remove_maintenance(&mut self, id: i64) -> bool {
        let before = self.maintenance.len();
        self.maintenance.retain(|t| t.id != id);
        self.maintenance.len() != before
    }

    pub fn upsert_user(&mut self, user: User) {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => *slot = user,
            None => self.users.push(user),
        }
    }

    pub fn remove_user(&mut self, id: i64) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        self.users.len() != before
    }

    /// Marks a resident approved by `approver`. Non-residents are left alone.
    pub fn mark_user_approved(&mut self, id: i64, approver: i64) -> bool {
        let Some(user) = self.users.iter_mut().find(|u| u.id == id) else {
            return false;
        };
        match &mut user.role {
            UserRole::Resident { approved_by, .. } => {
                *approved_by = Some(approver);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::models::*;

    pub fn task(id: i64, block_id: i64, due_to: &str, status: TaskStatus) -> MaintenanceTask {
        MaintenanceTask {
            id,
            task: format!("Task {id}"),
            building_id: 1,
            block_id,
            subcontractor: None,
            category: 1,
            status,
            comment: None,
            due_to: due_to.to_string(),
            created_at: "2024-01-01T09:00:00Z".to_string(),
        }
    }

    pub fn resident(id: i64, block_id: i64) -> User {
        User {
            id,
            full_name: format!("Resident {id}"),
            email: format!("resident{id}@condo.pt"),
            building_id: Some(1),
            role: UserRole::Resident {
                unit: Some(format!("{id}A")),
                block_id: Some(block_id),
                approved_by: None,
            },
        }
    }

    pub fn subcontractor(id: i64, service_type: i64) -> User {
        User {
            id,
            full_name: format!("Sub {id}"),
            email: format!("sub{id}@co.pt"),
            building_id: Some(1),
            role: UserRole::Subcontractor {
                company_name: Some(format!("Sub {id} Lda")),
                service_type: Some(service_type),
                phone: None,
            },
        }
    }

    pub fn snapshot() -> DashboardSnapshot {
        let mut assigned = task(10, 1, "2024-06-20", TaskStatus::InProgress);
        assigned.subcontractor = Some(5);
        assigned.category = 2;
        DashboardSnapshot {
            users: vec![resident(2, 1), subcontractor(5, 2), subcontractor(6, 3)],
            buildings: vec![Building {
                id: 1,
                name: "Torre Norte".to_string(),
                address: None,
                code: "TN".to_string(),
            }],
            blocks: vec![
                Block {
                    id: 1,
                    name: "Block A".to_string(),
                    building_id: 1,
                },
                Block {
                    id: 2,
                    name: "Block B".to_string(),
                    building_id: 1,
                },
            ],
            services: vec![
                Service {
                    id: 1,
                    name: "Cleaning".to_string(),
                },
                Service {
                    id: 2,
                    name: "Plumbing".to_string(),
                },
            ],
            maintenance: vec![task(9, 2, "2024-06-01", TaskStatus::Pending), assigned],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::domain::models::TaskStatus;

    #[test]
    fn test_name_fallbacks() {
        let snap = snapshot();
        assert_eq!(snap.block_name(2), "Block B");
        assert_eq!(snap.block_name(99), "Unknown");
        assert_eq!(snap.building_name(1), "Torre Norte");
        assert_eq!(snap.building_name(42), "Unknown");
        assert_eq!(snap.service_name(7), "Unknown");
        assert_eq!(snap.subcontractor_name(Some(5)), "Sub 5");
        assert_eq!(snap.subcontractor_name(Some(77)), "None");
        assert_eq!(snap.subcontractor_name(None), "None");
    }

    #[test]
    fn test_role_views() {
        let snap = snapshot();
        assert_eq!(snap.residents().count(), 1);
        assert_eq!(snap.subcontractors().count(), 2);
        let plumbers: Vec<i64> = snap.subcontractors_for_service(2).map(|u| u.id).collect();
        assert_eq!(plumbers, vec![5]);
        let assigned: Vec<i64> = snap.assigned_tasks(5).map(|t| t.id).collect();
        assert_eq!(assigned, vec![10]);
    }

    #[test]
    fn test_upsert_replaces_by_id_or_appends() {
        let mut snap = snapshot();
        let mut edited = task(9, 2, "2024-07-01", TaskStatus::Completed);
        edited.task = "Edited".to_string();
        snap.upsert_maintenance(edited);
        assert_eq!(snap.maintenance.len(), 2);
        assert_eq!(snap.maintenance[0].task, "Edited");

        snap.upsert_maintenance(task(11, 1, "2024-08-01", TaskStatus::Pending));
        assert_eq!(snap.maintenance.len(), 3);

        assert!(snap.remove_maintenance(11));
        assert!(!snap.remove_maintenance(11));
    }

    #[test]
    fn test_mark_user_approved_only_for_residents() {
        let mut snap = snapshot();
        assert!(snap.mark_user_approved(2, 1));
        assert!(snap.users[0].is_approved());
        assert!(!snap.mark_user_approved(5, 1));
        assert!(!snap.mark_user_approved(404, 1));
        assert!(snap.remove_user(2));
        assert_eq!(snap.residents().count(), 0);
    }
}
