//! SQLite backend.
//!
//! A single database file with three tables — `tasks`, `goals`,
//! `milestones` — created on startup. Calendar dates are stored as ISO
//! `YYYY-MM-DD` text and timestamps as RFC 3339 text, so date-window
//! comparisons work with plain lexicographic SQL.

use crate::validate::{normalize_text, validate_progress, validate_title};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lodestar_core::error::StoreError;
use lodestar_core::identity::UserId;
use lodestar_core::store::{
    CompletionStats, GoalActions, GoalPatch, GoalRecord, GoalStatus, GoalSummary,
    MilestoneActions, MilestoneRecord, MilestoneStatus, MilestoneSummary, NewGoal, NewMilestone,
    NewTask, Priority, ProductivityQueries, TaskActions, TaskPatch, TaskRecord, TaskStatus,
    TaskSummary,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

const TASK_NOT_FOUND: &str = "Task not found or access denied";
const GOAL_NOT_FOUND: &str = "Goal not found or access denied";
const MILESTONE_NOT_FOUND: &str = "Milestone not found or access denied";

/// A persistent SQLite store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and all tables/indexes are created automatically.
    /// Pass `":memory:"` for an in-process ephemeral database.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        // A pooled ":memory:" database would give every connection its own
        // empty database; pin it to a single connection instead.
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id                 TEXT PRIMARY KEY,
                user_id            TEXT NOT NULL,
                title              TEXT NOT NULL,
                description        TEXT,
                status             TEXT NOT NULL DEFAULT 'pending',
                priority           TEXT NOT NULL DEFAULT 'medium',
                project            TEXT,
                due_date           TEXT,
                milestone_id       TEXT,
                time_spent_minutes INTEGER NOT NULL DEFAULT 0,
                created_at         TEXT NOT NULL,
                updated_at         TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("tasks table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS goals (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                title       TEXT NOT NULL,
                description TEXT,
                status      TEXT NOT NULL DEFAULT 'active',
                target_date TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("goals table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS milestones (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                goal_id     TEXT NOT NULL,
                title       TEXT NOT NULL,
                description TEXT,
                status      TEXT NOT NULL DEFAULT 'not_started',
                progress    INTEGER NOT NULL DEFAULT 0,
                target_date TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("milestones table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tasks_user_status ON tasks(user_id, status)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("tasks index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tasks_user_due ON tasks(user_id, due_date)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("tasks due index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    async fn fetch_task(&self, user: &UserId, task_id: &str) -> Result<TaskRecord, StoreError> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?1 AND user_id = ?2")
            .bind(task_id)
            .bind(user.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("task lookup: {e}")))?;

        match row {
            Some(row) => row_to_task(&row),
            None => Err(StoreError::NotFound(TASK_NOT_FOUND.into())),
        }
    }

    async fn fetch_goal(&self, user: &UserId, goal_id: &str) -> Result<GoalRecord, StoreError> {
        let row = sqlx::query("SELECT * FROM goals WHERE id = ?1 AND user_id = ?2")
            .bind(goal_id)
            .bind(user.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("goal lookup: {e}")))?;

        match row {
            Some(row) => row_to_goal(&row),
            None => Err(StoreError::NotFound(GOAL_NOT_FOUND.into())),
        }
    }

    async fn fetch_milestone(
        &self,
        user: &UserId,
        milestone_id: &str,
    ) -> Result<MilestoneRecord, StoreError> {
        let row = sqlx::query("SELECT * FROM milestones WHERE id = ?1 AND user_id = ?2")
            .bind(milestone_id)
            .bind(user.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("milestone lookup: {e}")))?;

        match row {
            Some(row) => row_to_milestone(&row),
            None => Err(StoreError::NotFound(MILESTONE_NOT_FOUND.into())),
        }
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────

fn get_text(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<String, StoreError> {
    row.try_get(column)
        .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))
}

fn get_opt_text(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Option<String>, StoreError> {
    row.try_get(column)
        .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))
}

fn parse_date(value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| StoreError::QueryFailed(format!("Bad stored date '{value}': {e}")))
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_task_status(value: &str) -> Result<TaskStatus, StoreError> {
    match value {
        "pending" => Ok(TaskStatus::Pending),
        "in_progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        other => Err(StoreError::QueryFailed(format!("Bad task status '{other}'"))),
    }
}

fn parse_goal_status(value: &str) -> Result<GoalStatus, StoreError> {
    match value {
        "active" => Ok(GoalStatus::Active),
        "completed" => Ok(GoalStatus::Completed),
        "archived" => Ok(GoalStatus::Archived),
        other => Err(StoreError::QueryFailed(format!("Bad goal status '{other}'"))),
    }
}

fn parse_milestone_status(value: &str) -> Result<MilestoneStatus, StoreError> {
    match value {
        "not_started" => Ok(MilestoneStatus::NotStarted),
        "in_progress" => Ok(MilestoneStatus::InProgress),
        "completed" => Ok(MilestoneStatus::Completed),
        other => Err(StoreError::QueryFailed(format!(
            "Bad milestone status '{other}'"
        ))),
    }
}

fn parse_priority(value: &str) -> Result<Priority, StoreError> {
    match value {
        "high" => Ok(Priority::High),
        "medium" => Ok(Priority::Medium),
        "low" => Ok(Priority::Low),
        other => Err(StoreError::QueryFailed(format!("Bad priority '{other}'"))),
    }
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<TaskRecord, StoreError> {
    let due_date = get_opt_text(row, "due_date")?
        .map(|d| parse_date(&d))
        .transpose()?;
    let time_spent_minutes: i64 = row
        .try_get("time_spent_minutes")
        .map_err(|e| StoreError::QueryFailed(format!("time_spent_minutes column: {e}")))?;

    Ok(TaskRecord {
        id: get_text(row, "id")?,
        user_id: UserId(get_text(row, "user_id")?),
        title: get_text(row, "title")?,
        description: get_opt_text(row, "description")?,
        status: parse_task_status(&get_text(row, "status")?)?,
        priority: parse_priority(&get_text(row, "priority")?)?,
        project: get_opt_text(row, "project")?,
        due_date,
        milestone_id: get_opt_text(row, "milestone_id")?,
        time_spent_minutes,
        created_at: parse_timestamp(&get_text(row, "created_at")?),
        updated_at: parse_timestamp(&get_text(row, "updated_at")?),
    })
}

fn row_to_goal(row: &sqlx::sqlite::SqliteRow) -> Result<GoalRecord, StoreError> {
    Ok(GoalRecord {
        id: get_text(row, "id")?,
        user_id: UserId(get_text(row, "user_id")?),
        title: get_text(row, "title")?,
        description: get_opt_text(row, "description")?,
        status: parse_goal_status(&get_text(row, "status")?)?,
        target_date: parse_date(&get_text(row, "target_date")?)?,
        created_at: parse_timestamp(&get_text(row, "created_at")?),
        updated_at: parse_timestamp(&get_text(row, "updated_at")?),
    })
}

fn row_to_milestone(row: &sqlx::sqlite::SqliteRow) -> Result<MilestoneRecord, StoreError> {
    let progress: i64 = row
        .try_get("progress")
        .map_err(|e| StoreError::QueryFailed(format!("progress column: {e}")))?;

    Ok(MilestoneRecord {
        id: get_text(row, "id")?,
        user_id: UserId(get_text(row, "user_id")?),
        goal_id: get_text(row, "goal_id")?,
        title: get_text(row, "title")?,
        description: get_opt_text(row, "description")?,
        status: parse_milestone_status(&get_text(row, "status")?)?,
        progress: progress.clamp(0, 100) as u8,
        target_date: parse_date(&get_text(row, "target_date")?)?,
        created_at: parse_timestamp(&get_text(row, "created_at")?),
        updated_at: parse_timestamp(&get_text(row, "updated_at")?),
    })
}

// ── Queries ───────────────────────────────────────────────────────────────

#[async_trait]
impl ProductivityQueries for SqliteStore {
    async fn active_tasks(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM tasks
            WHERE user_id = ?1 AND status IN ('pending', 'in_progress')
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(user.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("active tasks: {e}")))?;

        rows.iter()
            .map(|row| row_to_task(row).map(|t| t.summary()))
            .collect()
    }

    async fn active_goals(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<GoalSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM goals
            WHERE user_id = ?1 AND status = 'active'
            ORDER BY target_date ASC
            LIMIT ?2
            "#,
        )
        .bind(user.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("active goals: {e}")))?;

        rows.iter()
            .map(|row| row_to_goal(row).map(|g| g.summary()))
            .collect()
    }

    async fn active_milestones(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<MilestoneSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM milestones
            WHERE user_id = ?1 AND status IN ('not_started', 'in_progress')
            ORDER BY target_date ASC
            LIMIT ?2
            "#,
        )
        .bind(user.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("active milestones: {e}")))?;

        rows.iter()
            .map(|row| row_to_milestone(row).map(|m| m.summary()))
            .collect()
    }

    async fn completions_since(
        &self,
        user: &UserId,
        since: NaiveDate,
    ) -> Result<CompletionStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n, COALESCE(SUM(time_spent_minutes), 0) AS minutes
            FROM tasks
            WHERE user_id = ?1 AND status = 'completed' AND updated_at >= ?2
            "#,
        )
        .bind(user.as_str())
        .bind(since.format("%Y-%m-%d").to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("weekly completions: {e}")))?;

        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?;
        let minutes: i64 = row
            .try_get("minutes")
            .map_err(|e| StoreError::QueryFailed(format!("minutes column: {e}")))?;

        Ok(CompletionStats {
            tasks_completed: n.max(0) as usize,
            total_minutes: minutes,
        })
    }

    async fn tasks_due_through(
        &self,
        user: &UserId,
        horizon: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TaskSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM tasks
            WHERE user_id = ?1
              AND status IN ('pending', 'in_progress')
              AND due_date IS NOT NULL
              AND due_date <= ?2
            ORDER BY due_date ASC
            LIMIT ?3
            "#,
        )
        .bind(user.as_str())
        .bind(horizon.format("%Y-%m-%d").to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("deadline window: {e}")))?;

        rows.iter()
            .map(|row| row_to_task(row).map(|t| t.summary()))
            .collect()
    }
}

// ── Mutations ─────────────────────────────────────────────────────────────

#[async_trait]
impl TaskActions for SqliteStore {
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

        sqlx::query(
            r#"
            INSERT INTO tasks
                (id, user_id, title, description, status, priority, project,
                 due_date, milestone_id, time_spent_minutes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&record.id)
        .bind(record.user_id.as_str())
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(record.priority.as_str())
        .bind(&record.project)
        .bind(record.due_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&record.milestone_id)
        .bind(record.time_spent_minutes)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("create task: {e}")))?;

        Ok(record)
    }

    async fn update_task(
        &self,
        user: &UserId,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<TaskRecord, StoreError> {
        let mut record = self.fetch_task(user, task_id).await?;

        if let Some(title) = patch.title.as_deref() {
            record.title = validate_title(title)?;
        }
        if let Some(description) = patch.description {
            record.description = normalize_text(Some(description));
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(milestone_id) = patch.milestone_id {
            record.milestone_id = Some(milestone_id);
        }
        if let Some(project) = patch.project {
            record.project = normalize_text(Some(project));
        }
        if let Some(priority) = patch.priority {
            record.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            record.due_date = Some(due_date);
        }
        record.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE tasks SET
                title = ?1, description = ?2, status = ?3, priority = ?4,
                project = ?5, due_date = ?6, milestone_id = ?7, updated_at = ?8
            WHERE id = ?9 AND user_id = ?10
            "#,
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(record.priority.as_str())
        .bind(&record.project)
        .bind(record.due_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&record.milestone_id)
        .bind(record.updated_at.to_rfc3339())
        .bind(task_id)
        .bind(user.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("update task: {e}")))?;

        Ok(record)
    }

    async fn delete_task(&self, user: &UserId, task_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND user_id = ?2")
            .bind(task_id)
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("delete task: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(TASK_NOT_FOUND.into()));
        }
        Ok(())
    }
}

#[async_trait]
impl GoalActions for SqliteStore {
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

        sqlx::query(
            r#"
            INSERT INTO goals
                (id, user_id, title, description, status, target_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.id)
        .bind(record.user_id.as_str())
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(record.target_date.format("%Y-%m-%d").to_string())
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("create goal: {e}")))?;

        Ok(record)
    }

    async fn update_goal(
        &self,
        user: &UserId,
        goal_id: &str,
        patch: GoalPatch,
    ) -> Result<GoalRecord, StoreError> {
        let mut record = self.fetch_goal(user, goal_id).await?;

        if let Some(title) = patch.title.as_deref() {
            record.title = validate_title(title)?;
        }
        if let Some(description) = patch.description {
            record.description = normalize_text(Some(description));
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(target_date) = patch.target_date {
            record.target_date = target_date;
        }
        record.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE goals SET
                title = ?1, description = ?2, status = ?3, target_date = ?4, updated_at = ?5
            WHERE id = ?6 AND user_id = ?7
            "#,
        )
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(record.target_date.format("%Y-%m-%d").to_string())
        .bind(record.updated_at.to_rfc3339())
        .bind(goal_id)
        .bind(user.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("update goal: {e}")))?;

        Ok(record)
    }

    async fn list_goals(
        &self,
        user: &UserId,
        status: Option<GoalStatus>,
    ) -> Result<Vec<GoalRecord>, StoreError> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT * FROM goals
                    WHERE user_id = ?1 AND status = ?2
                    ORDER BY target_date ASC
                    "#,
                )
                .bind(user.as_str())
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM goals WHERE user_id = ?1 ORDER BY target_date ASC",
                )
                .bind(user.as_str())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StoreError::QueryFailed(format!("list goals: {e}")))?;

        rows.iter().map(row_to_goal).collect()
    }
}

#[async_trait]
impl MilestoneActions for SqliteStore {
    async fn create_milestone(
        &self,
        user: &UserId,
        milestone: NewMilestone,
    ) -> Result<MilestoneRecord, StoreError> {
        let title = validate_title(&milestone.title)?;
        let progress = validate_progress(milestone.progress.unwrap_or(0))?;

        // The parent goal must exist and belong to the caller.
        self.fetch_goal(user, &milestone.goal_id).await?;

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

        sqlx::query(
            r#"
            INSERT INTO milestones
                (id, user_id, goal_id, title, description, status, progress,
                 target_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&record.id)
        .bind(record.user_id.as_str())
        .bind(&record.goal_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(record.progress as i64)
        .bind(record.target_date.format("%Y-%m-%d").to_string())
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("create milestone: {e}")))?;

        Ok(record)
    }

    async fn update_milestone_progress(
        &self,
        user: &UserId,
        milestone_id: &str,
        progress: u8,
    ) -> Result<MilestoneRecord, StoreError> {
        let progress = validate_progress(progress)?;
        let mut record = self.fetch_milestone(user, milestone_id).await?;

        record.progress = progress;
        record.status = MilestoneStatus::from_progress(progress);
        record.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE milestones SET progress = ?1, status = ?2, updated_at = ?3
            WHERE id = ?4 AND user_id = ?5
            "#,
        )
        .bind(record.progress as i64)
        .bind(record.status.as_str())
        .bind(record.updated_at.to_rfc3339())
        .bind(milestone_id)
        .bind(user.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("update milestone: {e}")))?;

        Ok(record)
    }

    async fn list_milestones(
        &self,
        user: &UserId,
        goal_id: Option<&str>,
    ) -> Result<Vec<MilestoneRecord>, StoreError> {
        let rows = match goal_id {
            Some(goal_id) => {
                sqlx::query(
                    r#"
                    SELECT * FROM milestones
                    WHERE user_id = ?1 AND goal_id = ?2
                    ORDER BY target_date ASC
                    "#,
                )
                .bind(user.as_str())
                .bind(goal_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM milestones WHERE user_id = ?1 ORDER BY target_date ASC",
                )
                .bind(user.as_str())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StoreError::QueryFailed(format!("list milestones: {e}")))?;

        rows.iter().map(row_to_milestone).collect()
    }
}
