//! Backing-store boundary: read-only summaries for context assembly and the
//! mutation traits the tool executor drives.
//!
//! The store owns the canonical lifecycle of tasks, goals and milestones;
//! this crate only defines the views and operations the coordinator needs.
//! Query implementations must return empty results (not errors) for
//! "no rows"; errors are reserved for genuine transport/storage failure.
//! Mutation implementations enforce ownership — every operation is scoped to
//! the authenticated `UserId` — and field-level validation, and phrase
//! ownership failures as "not found or access denied".

use crate::error::StoreError;
use crate::identity::UserId;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Status enums ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// The statuses considered "active" for context assembly.
    pub const ACTIVE: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::InProgress];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Archived,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Status derived from a progress percentage (0–100).
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            0 => Self::NotStarted,
            100 => Self::Completed,
            _ => Self::InProgress,
        }
    }

    pub const ACTIVE: [MilestoneStatus; 2] =
        [MilestoneStatus::NotStarted, MilestoneStatus::InProgress];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

// ── Read-only summaries (context assembly views) ──────────────────────────

/// A task as the coordinator sees it: id, title, status, and the
/// status-relevant dates and links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSummary {
    pub id: String,
    pub title: String,
    pub status: GoalStatus,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneSummary {
    pub id: String,
    pub title: String,
    pub status: MilestoneStatus,
    /// Progress percentage, 0–100.
    pub progress: u8,
    pub target_date: NaiveDate,
    pub goal_id: String,
}

/// Aggregated completion metrics since a given date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionStats {
    pub tasks_completed: usize,
    pub total_minutes: i64,
}

// ── Full records (mutation results) ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub user_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<String>,
    /// Minutes tracked against this task (feeds weekly progress totals).
    #[serde(default)]
    pub time_spent_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
            priority: self.priority,
            project: self.project.clone(),
            due_date: self.due_date,
            milestone_id: self.milestone_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRecord {
    pub id: String,
    pub user_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: GoalStatus,
    pub target_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GoalRecord {
    pub fn summary(&self) -> GoalSummary {
        GoalSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
            target_date: self.target_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub id: String,
    pub user_id: UserId,
    pub goal_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: MilestoneStatus,
    pub progress: u8,
    pub target_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MilestoneRecord {
    pub fn summary(&self) -> MilestoneSummary {
        MilestoneSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
            progress: self.progress,
            target_date: self.target_date,
            goal_id: self.goal_id.clone(),
        }
    }
}

// ── Mutation inputs ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub milestone_id: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Partial task update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub milestone_id: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
}

/// Partial goal update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMilestone {
    pub goal_id: String,
    pub title: String,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<u8>,
}

// ── Boundary traits ───────────────────────────────────────────────────────

/// Read-only queries the context assembler issues.
#[async_trait]
pub trait ProductivityQueries: Send + Sync {
    /// Active (pending or in-progress) tasks, most recently created first.
    async fn active_tasks(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, StoreError>;

    /// Active goals, soonest target date first.
    async fn active_goals(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<GoalSummary>, StoreError>;

    /// Active (not-started or in-progress) milestones, soonest target first.
    async fn active_milestones(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<MilestoneSummary>, StoreError>;

    /// Completion count and tracked minutes for tasks completed since
    /// `since` (inclusive).
    async fn completions_since(
        &self,
        user: &UserId,
        since: NaiveDate,
    ) -> Result<CompletionStats, StoreError>;

    /// Active tasks with a due date on or before `horizon`, due-date
    /// ascending. Tasks without a due date are never returned.
    async fn tasks_due_through(
        &self,
        user: &UserId,
        horizon: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, StoreError>;
}

/// Task mutations. Each operation is scoped to the authenticated user.
#[async_trait]
pub trait TaskActions: Send + Sync {
    async fn create_task(&self, user: &UserId, task: NewTask) -> Result<TaskRecord, StoreError>;

    async fn update_task(
        &self,
        user: &UserId,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<TaskRecord, StoreError>;

    async fn delete_task(&self, user: &UserId, task_id: &str) -> Result<(), StoreError>;
}

/// Goal mutations and listing.
#[async_trait]
pub trait GoalActions: Send + Sync {
    async fn create_goal(&self, user: &UserId, goal: NewGoal) -> Result<GoalRecord, StoreError>;

    async fn update_goal(
        &self,
        user: &UserId,
        goal_id: &str,
        patch: GoalPatch,
    ) -> Result<GoalRecord, StoreError>;

    async fn list_goals(
        &self,
        user: &UserId,
        status: Option<GoalStatus>,
    ) -> Result<Vec<GoalRecord>, StoreError>;
}

/// Milestone mutations and listing.
#[async_trait]
pub trait MilestoneActions: Send + Sync {
    async fn create_milestone(
        &self,
        user: &UserId,
        milestone: NewMilestone,
    ) -> Result<MilestoneRecord, StoreError>;

    async fn update_milestone_progress(
        &self,
        user: &UserId,
        milestone_id: &str,
        progress: u8,
    ) -> Result<MilestoneRecord, StoreError>;

    async fn list_milestones(
        &self,
        user: &UserId,
        goal_id: Option<&str>,
    ) -> Result<Vec<MilestoneRecord>, StoreError>;
}

/// External read-only profile source. Fetch failures are recovered as an
/// absent profile by the assembler.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, user: &UserId) -> Result<BTreeMap<String, String>, StoreError>;
}
