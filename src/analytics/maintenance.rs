//! Maintenance overview for a resident's block: deadline buckets and a
//! per-month status histogram for the current year.

use crate::domain::models::{MaintenanceTask, TaskStatus};
use crate::time_utils::{following_month, month_abbrev, same_month, DisplayZone};
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatusCount {
    pub month: u32,
    pub label: &'static str,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl MonthlyStatusCount {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed
    }

    fn count(&mut self, status: &TaskStatus) {
        match status {
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Pending | TaskStatus::Other(_) => self.pending += 1,
        }
    }
}

/// The buckets overlap: a task due earlier this month and still open is both
/// past due and due this month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceOverview<'a> {
    pub year: i32,
    pub past_due: Vec<&'a MaintenanceTask>,
    pub due_this_month: Vec<&'a MaintenanceTask>,
    pub due_next_month: Vec<&'a MaintenanceTask>,
    pub histogram: Vec<MonthlyStatusCount>,
}

/// `now` is wall time in `zone`; due dates carrying an offset are converted
/// into the same zone before bucketing.
pub fn block_overview<'a>(
    tasks: &'a [MaintenanceTask],
    block_id: i64,
    zone: &DisplayZone,
    now: NaiveDateTime,
) -> MaintenanceOverview<'a> {
    let year = now.year();
    let (next_year, next_month) = following_month(year, now.month());

    let mut histogram: Vec<MonthlyStatusCount> = (1..=12)
        .map(|month| MonthlyStatusCount {
            month,
            label: month_abbrev(month),
            ..Default::default()
        })
        .collect();

    let mut overview = MaintenanceOverview {
        year,
        past_due: Vec::new(),
        due_this_month: Vec::new(),
        due_next_month: Vec::new(),
        histogram: Vec::new(),
    };

    for task in tasks.iter().filter(|t| t.block_id == block_id) {
        let Some(due) = task.due_at(zone) else {
            tracing::debug!("Skipping task {} with unreadable due date {:?}", task.id, task.due_to);
            continue;
        };

        if due < now && task.status != TaskStatus::Completed {
            overview.past_due.push(task);
        }
        if same_month(due, now) {
            overview.due_this_month.push(task);
        }
        if due.year() == next_year && due.month() == next_month {
            overview.due_next_month.push(task);
        }
        if due.year() == year {
            histogram[due.month0() as usize].count(&task.status);
        }
    }

    overview.histogram = histogram;
    overview
}
