//! The per-request context snapshot.
//!
//! Built fresh for every inbound message and discarded afterwards — it
//! carries no identity beyond the request and is never cached. Every list
//! field defaults to an empty sequence when its source query fails, so the
//! formatter never branches on a missing key.

use chrono::NaiveDate;
use lodestar_core::identity::UserId;
use lodestar_core::store::{GoalSummary, MilestoneSummary, TaskStatus, TaskSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calendar anchor for the request, computed at assembly time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayContext {
    pub date: NaiveDate,
    /// Weekday label, e.g. "Friday".
    pub day_of_week: String,
}

/// Completion metrics since the most recent Monday. The week start is
/// computed locally and always present; the counts fall back to zero when
/// the completions query fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub tasks_completed: usize,
    pub total_minutes: i64,
}

/// A bounded, per-request view of one user's productivity state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Injected by the caller — never supplied by the model.
    pub user_id: UserId,

    pub today: TodayContext,
    pub weekly_progress: WeeklySummary,

    /// Tasks due within 3 days (overdue included), due-date ascending.
    pub urgent_deadlines: Vec<TaskSummary>,
    /// Tasks due strictly after the urgent window, within 10 days.
    pub upcoming_deadlines: Vec<TaskSummary>,

    /// Active goals, soonest target first.
    pub active_goals: Vec<GoalSummary>,
    /// Active milestones, soonest target first.
    pub active_milestones: Vec<MilestoneSummary>,
    /// Active tasks, most recently created first.
    pub active_tasks: Vec<TaskSummary>,

    /// Free-form profile from the external source; absent on fetch failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<BTreeMap<String, String>>,
}

/// Summary counts derived from a snapshot, rendered at the end of the
/// formatted context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStats {
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub total_goals: usize,
    pub active_milestones: usize,
    pub urgent_count: usize,
    pub upcoming_count: usize,
}

impl ContextSnapshot {
    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            total_tasks: self.active_tasks.len(),
            pending_tasks: self
                .active_tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Pending)
                .count(),
            total_goals: self.active_goals.len(),
            active_milestones: self.active_milestones.len(),
            urgent_count: self.urgent_deadlines.len(),
            upcoming_count: self.upcoming_deadlines.len(),
        }
    }
}
