//! In-memory backend — useful for testing and ephemeral sessions.

use crate::validate::{normalize_text, validate_progress, validate_title};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use lodestar_core::error::StoreError;
use lodestar_core::identity::UserId;
use lodestar_core::store::{
    CompletionStats, GoalActions, GoalPatch, GoalRecord, GoalStatus, GoalSummary,
    MilestoneActions, MilestoneRecord, MilestoneStatus, MilestoneSummary, NewGoal, NewMilestone,
    NewTask, Priority, ProductivityQueries, TaskActions, TaskPatch, TaskRecord, TaskStatus,
    TaskSummary,
};
use tokio::sync::RwLock;
use uuid::Uuid;

const TASK_NOT_FOUND: &str = "Task not found or access denied";
const GOAL_NOT_FOUND: &str = "Goal not found or access denied";
const MILESTONE_NOT_FOUND: &str = "Milestone not found or access denied";

/// An in-memory store that keeps all records in Vecs behind RwLocks.
#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<Vec<TaskRecord>>,
    goals: RwLock<Vec<GoalRecord>>,
    milestones: RwLock<Vec<MilestoneRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a task directly, bypassing validation. Test helper.
    pub async fn seed_task(&self, task: TaskRecord) {
        self.tasks.write().await.push(task);
    }

    /// Seed a goal directly, bypassing validation. Test helper.
    pub async fn seed_goal(&self, goal: GoalRecord) {
        self.goals.write().await.push(goal);
    }

    /// Seed a milestone directly, bypassing validation. Test helper.
    pub async fn seed_milestone(&self, milestone: MilestoneRecord) {
        self.milestones.write().await.push(milestone);
    }
}

#[async_trait]
impl ProductivityQueries for MemoryStore {
    async fn active_tasks(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut active: Vec<&TaskRecord> = tasks
            .iter()
            .filter(|t| t.user_id == *user && TaskStatus::ACTIVE.contains(&t.status))
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active.into_iter().take(limit).map(|t| t.summary()).collect())
    }

    async fn active_goals(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<GoalSummary>, StoreError> {
        let goals = self.goals.read().await;
        let mut active: Vec<&GoalRecord> = goals
            .iter()
            .filter(|g| g.user_id == *user && g.status == GoalStatus::Active)
            .collect();
        active.sort_by_key(|g| g.target_date);
        Ok(active.into_iter().take(limit).map(|g| g.summary()).collect())
    }

    async fn active_milestones(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<MilestoneSummary>, StoreError> {
        let milestones = self.milestones.read().await;
        let mut active: Vec<&MilestoneRecord> = milestones
            .iter()
            .filter(|m| m.user_id == *user && MilestoneStatus::ACTIVE.contains(&m.status))
            .collect();
        active.sort_by_key(|m| m.target_date);
        Ok(active.into_iter().take(limit).map(|m| m.summary()).collect())
    }

    async fn completions_since(
        &self,
        user: &UserId,
        since: NaiveDate,
    ) -> Result<CompletionStats, StoreError> {
        let tasks = self.tasks.read().await;
        let completed: Vec<&TaskRecord> = tasks
            .iter()
            .filter(|t| {
                t.user_id == *user
                    && t.status == TaskStatus::Completed
                    && t.updated_at.date_naive() >= since
            })
            .collect();
        Ok(CompletionStats {
            tasks_completed: completed.len(),
            total_minutes: completed.iter().map(|t| t.time_spent_minutes).sum(),
        })
    }

    async fn tasks_due_through(
        &self,
        user: &UserId,
        horizon: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut due: Vec<&TaskRecord> = tasks
            .iter()
            .filter(|t| {
                t.user_id == *user
                    && TaskStatus::ACTIVE.contains(&t.status)
                    && t.due_date.is_some_and(|d| d <= horizon)
            })
            .collect();
        due.sort_by_key(|t| t.due_date);
        Ok(due.into_iter().take(limit).map(|t| t.summary()).collect())
    }
}

#[async_trait]
impl TaskActions for MemoryStore {
    async fn create_task(&self, user: &UserId, task: NewTask) -> Result<TaskRecord, StoreError> {
        let title = validate_title(&task.title)?;
        let now = Utc::now();
        let record = TaskRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user.clone(),
            title,
            description: normalize_text(task.description),
            status: task.status.unwrap_or(TaskStatus::Pending),
            priority: task.priority.unwrap_or(Priority::Medium),
            project: normalize_text(task.project),
            due_date: task.due_date,
            milestone_id: task.milestone_id,
            time_spent_minutes: 0,
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_task(
        &self,
        user: &UserId,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<TaskRecord, StoreError> {
        // Validate before taking the write lock so a bad patch mutates nothing.
        let title = patch.title.as_deref().map(validate_title).transpose()?;

        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.user_id == *user)
            .ok_or_else(|| StoreError::NotFound(TASK_NOT_FOUND.into()))?;

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = normalize_text(Some(description));
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(milestone_id) = patch.milestone_id {
            task.milestone_id = Some(milestone_id);
        }
        if let Some(project) = patch.project {
            task.project = normalize_text(Some(project));
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete_task(&self, user: &UserId, task_id: &str) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let len_before = tasks.len();
        tasks.retain(|t| !(t.id == task_id && t.user_id == *user));
        if tasks.len() == len_before {
            return Err(StoreError::NotFound(TASK_NOT_FOUND.into()));
        }
        Ok(())
    }
}

#[async_trait]
impl GoalActions for MemoryStore {
    async fn create_goal(&self, user: &UserId, goal: NewGoal) -> Result<GoalRecord, StoreError> {
        let title = validate_title(&goal.title)?;
        let now = Utc::now();
        let record = GoalRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user.clone(),
            title,
            description: normalize_text(goal.description),
            status: goal.status.unwrap_or(GoalStatus::Active),
            target_date: goal.target_date,
            created_at: now,
            updated_at: now,
        };
        self.goals.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_goal(
        &self,
        user: &UserId,
        goal_id: &str,
        patch: GoalPatch,
    ) -> Result<GoalRecord, StoreError> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;

        let mut goals = self.goals.write().await;
        let goal = goals
            .iter_mut()
            .find(|g| g.id == goal_id && g.user_id == *user)
            .ok_or_else(|| StoreError::NotFound(GOAL_NOT_FOUND.into()))?;

        if let Some(title) = title {
            goal.title = title;
        }
        if let Some(description) = patch.description {
            goal.description = normalize_text(Some(description));
        }
        if let Some(status) = patch.status {
            goal.status = status;
        }
        if let Some(target_date) = patch.target_date {
            goal.target_date = target_date;
        }
        goal.updated_at = Utc::now();
        Ok(goal.clone())
    }

    async fn list_goals(
        &self,
        user: &UserId,
        status: Option<GoalStatus>,
    ) -> Result<Vec<GoalRecord>, StoreError> {
        let goals = self.goals.read().await;
        let mut matching: Vec<GoalRecord> = goals
            .iter()
            .filter(|g| g.user_id == *user && status.is_none_or(|s| g.status == s))
            .cloned()
            .collect();
        matching.sort_by_key(|g| g.target_date);
        Ok(matching)
    }
}

#[async_trait]
impl MilestoneActions for MemoryStore {
    async fn create_milestone(
        &self,
        user: &UserId,
        milestone: NewMilestone,
    ) -> Result<MilestoneRecord, StoreError> {
        let title = validate_title(&milestone.title)?;
        let progress = validate_progress(milestone.progress.unwrap_or(0))?;

        // The parent goal must exist and belong to the caller.
        {
            let goals = self.goals.read().await;
            if !goals
                .iter()
                .any(|g| g.id == milestone.goal_id && g.user_id == *user)
            {
                return Err(StoreError::NotFound(GOAL_NOT_FOUND.into()));
            }
        }

        let now = Utc::now();
        let record = MilestoneRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user.clone(),
            goal_id: milestone.goal_id,
            title,
            description: normalize_text(milestone.description),
            status: MilestoneStatus::from_progress(progress),
            progress,
            target_date: milestone.target_date,
            created_at: now,
            updated_at: now,
        };
        self.milestones.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_milestone_progress(
        &self,
        user: &UserId,
        milestone_id: &str,
        progress: u8,
    ) -> Result<MilestoneRecord, StoreError> {
        let progress = validate_progress(progress)?;

        let mut milestones = self.milestones.write().await;
        let milestone = milestones
            .iter_mut()
            .find(|m| m.id == milestone_id && m.user_id == *user)
            .ok_or_else(|| StoreError::NotFound(MILESTONE_NOT_FOUND.into()))?;

        milestone.progress = progress;
        milestone.status = MilestoneStatus::from_progress(progress);
        milestone.updated_at = Utc::now();
        Ok(milestone.clone())
    }

    async fn list_milestones(
        &self,
        user: &UserId,
        goal_id: Option<&str>,
    ) -> Result<Vec<MilestoneRecord>, StoreError> {
        let milestones = self.milestones.read().await;
        let mut matching: Vec<MilestoneRecord> = milestones
            .iter()
            .filter(|m| m.user_id == *user && goal_id.is_none_or(|g| m.goal_id == g))
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.target_date);
        Ok(matching)
    }
}
