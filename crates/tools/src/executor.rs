//! The tool executor — routes model-proposed calls to backing operations.
//!
//! Execution discipline:
//! - calls run sequentially in request order; results come back in the same
//!   order, one per call
//! - the authenticated `UserId` is injected by the executor; a model-supplied
//!   `user_id` argument is stripped and never forwarded
//! - validation and ownership failures surface their message verbatim (the
//!   store phrases them safely); anything else becomes a generic message and
//!   the detail goes to the log
//! - a failing call never raises and never stops the rest of the batch

use crate::catalog::ToolName;
use chrono::NaiveDate;
use lodestar_core::error::StoreError;
use lodestar_core::identity::UserId;
use lodestar_core::store::{
    GoalActions, GoalPatch, GoalStatus, MilestoneActions, NewGoal, NewMilestone, NewTask,
    TaskActions, TaskPatch,
};
use lodestar_core::tool::{ToolCallRequest, ToolCallResult};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, warn};

/// Executes model-proposed tool calls against the configured backends.
///
/// Each backend is optional: a deployment without goal support still runs,
/// and calls against the missing capability come back as error results.
#[derive(Default, Clone)]
pub struct ToolExecutor {
    tasks: Option<Arc<dyn TaskActions>>,
    goals: Option<Arc<dyn GoalActions>>,
    milestones: Option<Arc<dyn MilestoneActions>>,
}

impl ToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_actions(mut self, tasks: Arc<dyn TaskActions>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn with_goal_actions(mut self, goals: Arc<dyn GoalActions>) -> Self {
        self.goals = Some(goals);
        self
    }

    pub fn with_milestone_actions(mut self, milestones: Arc<dyn MilestoneActions>) -> Self {
        self.milestones = Some(milestones);
        self
    }

    /// Whether any backend is configured. The orchestrator only offers tool
    /// definitions to the model when this is true.
    pub fn has_backends(&self) -> bool {
        self.tasks.is_some() || self.goals.is_some() || self.milestones.is_some()
    }

    /// Execute a batch of calls, one result per call, order preserved.
    pub async fn execute(&self, calls: &[ToolCallRequest], user: &UserId) -> Vec<ToolCallResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute_one(call, user).await);
        }
        results
    }

    async fn execute_one(&self, call: &ToolCallRequest, user: &UserId) -> ToolCallResult {
        let Some(name) = ToolName::parse(&call.name) else {
            return ToolCallResult::error(&call.name, format!("Unknown function: {}", call.name));
        };

        let args = match parse_raw_arguments(name, &call.arguments) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(name.as_str(), e.to_string()),
        };

        let outcome = match name {
            ToolName::CreateTask => self.run_create_task(args, user).await,
            ToolName::UpdateTask => self.run_update_task(args, user).await,
            ToolName::DeleteTask => self.run_delete_task(args, user).await,
            ToolName::CreateGoal => self.run_create_goal(args, user).await,
            ToolName::UpdateGoal => self.run_update_goal(args, user).await,
            ToolName::ListGoals => self.run_list_goals(args, user).await,
            ToolName::CreateMilestone => self.run_create_milestone(args, user).await,
            ToolName::UpdateMilestoneProgress => {
                self.run_update_milestone_progress(args, user).await
            }
            ToolName::ListMilestones => self.run_list_milestones(args, user).await,
        };

        match outcome {
            Ok(value) => ToolCallResult::success(name.as_str(), value),
            Err(e) if e.is_user_facing() => ToolCallResult::error(name.as_str(), e.to_string()),
            Err(e) => {
                error!(tool = %name, error = %e, "Tool execution failed");
                ToolCallResult::error(
                    name.as_str(),
                    format!("Unexpected error executing {name} — the operation was not completed"),
                )
            }
        }
    }

    // ── Backend accessors ─────────────────────────────────────────────────

    fn task_backend(&self) -> Result<&Arc<dyn TaskActions>, StoreError> {
        self.tasks
            .as_ref()
            .ok_or_else(|| StoreError::Validation("Task tools not available".into()))
    }

    fn goal_backend(&self) -> Result<&Arc<dyn GoalActions>, StoreError> {
        self.goals
            .as_ref()
            .ok_or_else(|| StoreError::Validation("Goal tools not available".into()))
    }

    fn milestone_backend(&self) -> Result<&Arc<dyn MilestoneActions>, StoreError> {
        self.milestones
            .as_ref()
            .ok_or_else(|| StoreError::Validation("Milestone tools not available".into()))
    }

    // ── Per-tool dispatch ─────────────────────────────────────────────────

    async fn run_create_task(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        let params: NewTask = parse_params(ToolName::CreateTask, args)?;
        let record = self.task_backend()?.create_task(user, params).await?;
        to_json(&record)
    }

    async fn run_update_task(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        #[derive(Deserialize)]
        struct Params {
            task_id: String,
            updates: TaskPatch,
        }
        let params: Params = parse_params(ToolName::UpdateTask, args)?;
        let record = self
            .task_backend()?
            .update_task(user, &params.task_id, params.updates)
            .await?;
        to_json(&record)
    }

    async fn run_delete_task(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        #[derive(Deserialize)]
        struct Params {
            task_id: String,
        }
        let params: Params = parse_params(ToolName::DeleteTask, args)?;
        self.task_backend()?.delete_task(user, &params.task_id).await?;
        Ok(serde_json::json!({ "deleted": true }))
    }

    async fn run_create_goal(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        #[derive(Deserialize)]
        struct Params {
            title: String,
            target_date: String,
            #[serde(default)]
            description: Option<String>,
            #[serde(default)]
            status: Option<GoalStatus>,
        }
        let params: Params = parse_params(ToolName::CreateGoal, args)?;
        let goal = NewGoal {
            title: params.title,
            target_date: parse_iso_date("target_date", &params.target_date)?,
            description: params.description,
            status: params.status,
        };
        let record = self.goal_backend()?.create_goal(user, goal).await?;
        to_json(&record)
    }

    async fn run_update_goal(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        #[derive(Deserialize)]
        struct Params {
            goal_id: String,
            updates: GoalPatch,
        }
        let params: Params = parse_params(ToolName::UpdateGoal, args)?;
        let record = self
            .goal_backend()?
            .update_goal(user, &params.goal_id, params.updates)
            .await?;
        to_json(&record)
    }

    async fn run_list_goals(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        #[derive(Deserialize)]
        struct Params {
            #[serde(default)]
            status: Option<GoalStatus>,
        }
        let params: Params = parse_params(ToolName::ListGoals, args)?;
        let goals = self.goal_backend()?.list_goals(user, params.status).await?;
        to_json(&goals)
    }

    async fn run_create_milestone(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        #[derive(Deserialize)]
        struct Params {
            goal_id: String,
            title: String,
            target_date: String,
            #[serde(default)]
            description: Option<String>,
            #[serde(default)]
            progress: Option<u8>,
        }
        let params: Params = parse_params(ToolName::CreateMilestone, args)?;
        let milestone = NewMilestone {
            goal_id: params.goal_id,
            title: params.title,
            target_date: parse_iso_date("target_date", &params.target_date)?,
            description: params.description,
            progress: params.progress,
        };
        let record = self
            .milestone_backend()?
            .create_milestone(user, milestone)
            .await?;
        to_json(&record)
    }

    async fn run_update_milestone_progress(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        #[derive(Deserialize)]
        struct Params {
            milestone_id: String,
            progress: u8,
        }
        let params: Params = parse_params(ToolName::UpdateMilestoneProgress, args)?;
        let record = self
            .milestone_backend()?
            .update_milestone_progress(user, &params.milestone_id, params.progress)
            .await?;
        to_json(&record)
    }

    async fn run_list_milestones(
        &self,
        args: serde_json::Value,
        user: &UserId,
    ) -> Result<serde_json::Value, StoreError> {
        #[derive(Deserialize)]
        struct Params {
            #[serde(default)]
            goal_id: Option<String>,
        }
        let params: Params = parse_params(ToolName::ListMilestones, args)?;
        let milestones = self
            .milestone_backend()?
            .list_milestones(user, params.goal_id.as_deref())
            .await?;
        to_json(&milestones)
    }
}

// ── Argument handling ─────────────────────────────────────────────────────

/// Parse the raw argument string into a JSON object and strip any
/// model-supplied `user_id` — identity comes from the caller, always.
fn parse_raw_arguments(name: ToolName, raw: &str) -> Result<serde_json::Value, StoreError> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    let mut value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| StoreError::Validation(format!("Invalid arguments for {name}: {e}")))?;

    if let Some(object) = value.as_object_mut() {
        if object.remove("user_id").is_some() {
            warn!(tool = %name, "Dropped model-supplied user_id argument");
        }
    }

    Ok(value)
}

fn parse_params<T: DeserializeOwned>(
    name: ToolName,
    args: serde_json::Value,
) -> Result<T, StoreError> {
    serde_json::from_value(args)
        .map_err(|e| StoreError::Validation(format!("Invalid arguments for {name}: {e}")))
}

fn parse_iso_date(field: &str, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        StoreError::Validation(format!("{field} must be an ISO date (YYYY-MM-DD)"))
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Storage(format!("serialize result: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use lodestar_core::store::{Priority, TaskRecord, TaskStatus};
    use lodestar_core::tool::ToolStatus;
    use tokio::sync::Mutex;

    /// Records the user id each call arrived with.
    #[derive(Default)]
    struct RecordingTasks {
        seen_users: Mutex<Vec<UserId>>,
        fail_with: Option<StoreError>,
    }

    impl RecordingTasks {
        fn failing(err: StoreError) -> Self {
            Self {
                seen_users: Mutex::new(Vec::new()),
                fail_with: Some(err),
            }
        }
    }

    #[async_trait]
    impl TaskActions for RecordingTasks {
        async fn create_task(
            &self,
            user: &UserId,
            task: NewTask,
        ) -> Result<TaskRecord, StoreError> {
            self.seen_users.lock().await.push(user.clone());
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            let now = Utc::now();
            Ok(TaskRecord {
                id: "task-1".into(),
                user_id: user.clone(),
                title: task.title,
                description: task.description,
                status: task.status.unwrap_or(TaskStatus::Pending),
                priority: task.priority.unwrap_or(Priority::Medium),
                project: task.project,
                due_date: task.due_date,
                milestone_id: task.milestone_id,
                time_spent_minutes: 0,
                created_at: now,
                updated_at: now,
            })
        }

        async fn update_task(
            &self,
            user: &UserId,
            _task_id: &str,
            _patch: TaskPatch,
        ) -> Result<TaskRecord, StoreError> {
            self.seen_users.lock().await.push(user.clone());
            Err(StoreError::NotFound("Task not found or access denied".into()))
        }

        async fn delete_task(&self, user: &UserId, _task_id: &str) -> Result<(), StoreError> {
            self.seen_users.lock().await.push(user.clone());
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            Ok(())
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn user() -> UserId {
        UserId::from("authentic-user")
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let executor = ToolExecutor::new();
        let results = executor
            .execute(&[call("drop_database", "{}")], &user())
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ToolStatus::Error);
        assert!(results[0].error.as_ref().unwrap().contains("Unknown function"));
    }

    #[tokio::test]
    async fn model_supplied_user_id_is_never_forwarded() {
        let tasks = Arc::new(RecordingTasks::default());
        let executor = ToolExecutor::new().with_task_actions(tasks.clone());

        let results = executor
            .execute(
                &[call(
                    "create_task",
                    r#"{"title": "Buy milk", "user_id": "someone-else"}"#,
                )],
                &user(),
            )
            .await;

        assert_eq!(results[0].status, ToolStatus::Success);
        let seen = tasks.seen_users.lock().await;
        assert_eq!(seen.as_slice(), &[user()]);
    }

    #[tokio::test]
    async fn missing_backend_yields_error_result() {
        let executor = ToolExecutor::new().with_task_actions(Arc::new(RecordingTasks::default()));
        let results = executor
            .execute(
                &[call(
                    "create_goal",
                    r#"{"title": "Learn Rust", "target_date": "2027-01-01"}"#,
                )],
                &user(),
            )
            .await;
        assert_eq!(results[0].error.as_deref(), Some("Goal tools not available"));
    }

    #[tokio::test]
    async fn not_found_message_is_verbatim() {
        let executor = ToolExecutor::new().with_task_actions(Arc::new(RecordingTasks::default()));
        let results = executor
            .execute(
                &[call("update_task", r#"{"task_id": "nope", "updates": {}}"#)],
                &user(),
            )
            .await;
        assert_eq!(
            results[0].error.as_deref(),
            Some("Task not found or access denied")
        );
    }

    #[tokio::test]
    async fn storage_failure_is_wrapped_generically() {
        let tasks = Arc::new(RecordingTasks::failing(StoreError::Storage(
            "connection to 10.0.0.5 refused".into(),
        )));
        let executor = ToolExecutor::new().with_task_actions(tasks);
        let results = executor
            .execute(&[call("create_task", r#"{"title": "Buy milk"}"#)], &user())
            .await;
        let message = results[0].error.as_ref().unwrap();
        assert!(message.contains("Unexpected error"));
        assert!(!message.contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_validation_errors() {
        let executor = ToolExecutor::new().with_task_actions(Arc::new(RecordingTasks::default()));
        let results = executor
            .execute(&[call("create_task", "not json at all")], &user())
            .await;
        assert_eq!(results[0].status, ToolStatus::Error);
        assert!(results[0].error.as_ref().unwrap().contains("Invalid arguments"));
    }

    #[tokio::test]
    async fn batch_preserves_order_and_isolates_failures() {
        let executor = ToolExecutor::new().with_task_actions(Arc::new(RecordingTasks::default()));
        let results = executor
            .execute(
                &[
                    call("create_task", r#"{"title": "First"}"#),
                    call("update_task", r#"{"task_id": "missing", "updates": {}}"#),
                    call("delete_task", r#"{"task_id": "t-3"}"#),
                ],
                &user(),
            )
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].tool, "create_task");
        assert_eq!(results[0].status, ToolStatus::Success);
        assert_eq!(results[1].tool, "update_task");
        assert_eq!(results[1].status, ToolStatus::Error);
        assert_eq!(results[2].tool, "delete_task");
        assert_eq!(results[2].status, ToolStatus::Success);
    }

    #[test]
    fn bad_iso_date_is_rejected() {
        let err = parse_iso_date("target_date", "soonish").unwrap_err();
        assert_eq!(
            err.to_string(),
            "target_date must be an ISO date (YYYY-MM-DD)"
        );
        assert!(parse_iso_date("target_date", " 2027-01-31 ").is_ok());
    }

    #[tokio::test]
    async fn empty_arguments_treated_as_empty_object() {
        let value = parse_raw_arguments(ToolName::ListGoals, "").unwrap();
        assert!(value.as_object().is_some_and(|o| o.is_empty()));
    }
}
