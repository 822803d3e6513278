use crate::domain::models::{MaintenanceTask, TaskStatus, User, UserRole};
use std::collections::BTreeSet;

/// Admin maintenance table filter. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub search: String,
    pub category: Option<i64>,
    pub block: Option<i64>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    /// Search is trimmed and case-insensitive over task text, status label
    /// and comment.
    pub fn matches(&self, task: &MaintenanceTask) -> bool {
        let needle = self.search.trim().to_lowercase();
        let found = needle.is_empty()
            || task.task.to_lowercase().contains(&needle)
            || task.status.label().to_lowercase().contains(&needle)
            || task
                .comment
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle));

        found
            && self.category.map_or(true, |c| task.category == c)
            && self.block.map_or(true, |b| task.block_id == b)
            && self.status.as_ref().map_or(true, |s| &task.status == s)
    }

    pub fn apply<'a>(&'a self, tasks: &'a [MaintenanceTask]) -> impl Iterator<Item = &'a MaintenanceTask> + 'a {
        tasks.iter().filter(move |t| self.matches(t))
    }
}

/// Sorted, de-duplicated status labels present in `tasks`.
pub fn distinct_statuses(tasks: &[MaintenanceTask]) -> Vec<String> {
    tasks
        .iter()
        .map(|t| t.status.label().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Admin residents table filter.
#[derive(Debug, Clone, Default)]
pub struct ResidentFilter {
    pub search: String,
    pub block: Option<i64>,
}

impl ResidentFilter {
    pub fn matches(&self, user: &User) -> bool {
        let UserRole::Resident { unit, block_id, .. } = &user.role else {
            return false;
        };
        let needle = self.search.trim().to_lowercase();
        let found = needle.is_empty()
            || user.full_name.to_lowercase().contains(&needle)
            || user.email.to_lowercase().contains(&needle)
            || unit
                .as_deref()
                .is_some_and(|u| u.to_lowercase().contains(&needle));

        found && self.block.map_or(true, |b| *block_id == Some(b))
    }

    pub fn apply<'a>(&'a self, users: &'a [User]) -> impl Iterator<Item = &'a User> + 'a {
        users.iter().filter(move |u| self.matches(u))
    }
}
