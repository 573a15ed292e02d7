//! Context assembly — gathers a bounded snapshot of the user's state.
//!
//! Five independent store queries run concurrently; each one that fails is
//! logged and replaced by its empty default, so assembly as a whole never
//! fails. The urgent/upcoming deadline windows are partitioned from a
//! single due-through query, which makes their disjointness structural
//! rather than a property of two separate filters agreeing.

use crate::context::snapshot::{ContextSnapshot, TodayContext, WeeklySummary};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use lodestar_core::error::StoreError;
use lodestar_core::identity::UserId;
use lodestar_core::store::{CompletionStats, ProductivityQueries, ProfileSource, TaskSummary};
use std::sync::Arc;
use tracing::warn;

/// Snapshot caps. The formatter applies its own, smaller presentation cap
/// on tasks; these bound what is fetched at all.
const TASK_LIMIT: usize = 20;
const GOAL_LIMIT: usize = 10;
const MILESTONE_LIMIT: usize = 20;
const URGENT_LIMIT: usize = 10;
const UPCOMING_LIMIT: usize = 15;
/// Fetch headroom for the deadline query before partitioning into windows.
const DEADLINE_FETCH_LIMIT: usize = 64;

const URGENT_WINDOW_DAYS: i64 = 3;
const UPCOMING_WINDOW_DAYS: i64 = 10;

/// Assembles per-request context snapshots. Stateless — create one and
/// share it.
pub struct ContextAssembler {
    queries: Arc<dyn ProductivityQueries>,
    profile: Option<Arc<dyn ProfileSource>>,
}

impl ContextAssembler {
    pub fn new(queries: Arc<dyn ProductivityQueries>) -> Self {
        Self {
            queries,
            profile: None,
        }
    }

    /// Attach an external profile source.
    pub fn with_profile_source(mut self, profile: Arc<dyn ProfileSource>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Build a snapshot for `user` as of `now`.
    ///
    /// Infallible by design: each failed query degrades to its empty
    /// default and the remaining fields are still populated.
    pub async fn assemble(&self, user: &UserId, now: DateTime<Utc>) -> ContextSnapshot {
        let today = now.date_naive();
        let week_start = most_recent_monday(today);
        let urgent_until = today + Duration::days(URGENT_WINDOW_DAYS);
        let upcoming_until = today + Duration::days(UPCOMING_WINDOW_DAYS);

        let (tasks, goals, milestones, completions, deadline_tasks, profile) = tokio::join!(
            self.queries.active_tasks(user, TASK_LIMIT),
            self.queries.active_goals(user, GOAL_LIMIT),
            self.queries.active_milestones(user, MILESTONE_LIMIT),
            self.queries.completions_since(user, week_start),
            self.queries
                .tasks_due_through(user, upcoming_until, DEADLINE_FETCH_LIMIT),
            self.fetch_profile(user),
        );

        let active_tasks = recover(user, "active tasks", tasks);
        let active_goals = recover(user, "active goals", goals);
        let active_milestones = recover(user, "active milestones", milestones);
        let completions = match completions {
            Ok(stats) => stats,
            Err(e) => {
                warn!(user = %user, error = %e, "Context query failed: weekly completions");
                CompletionStats::default()
            }
        };
        let deadline_tasks = recover(user, "deadline window", deadline_tasks);

        let (urgent_deadlines, upcoming_deadlines) =
            partition_deadlines(deadline_tasks, urgent_until);

        ContextSnapshot {
            user_id: user.clone(),
            today: TodayContext {
                date: today,
                day_of_week: today.format("%A").to_string(),
            },
            weekly_progress: WeeklySummary {
                week_start,
                tasks_completed: completions.tasks_completed,
                total_minutes: completions.total_minutes,
            },
            urgent_deadlines,
            upcoming_deadlines,
            active_goals,
            active_milestones,
            active_tasks,
            user_profile: profile,
        }
    }

    async fn fetch_profile(
        &self,
        user: &UserId,
    ) -> Option<std::collections::BTreeMap<String, String>> {
        let source = self.profile.as_ref()?;
        match source.fetch_profile(user).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(user = %user, error = %e, "Profile fetch failed");
                None
            }
        }
    }
}

/// Most recent Monday at or before `date` (ISO weekday 1).
fn most_recent_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Split the due-through result into the urgent (≤ now + 3d) and upcoming
/// (strictly later, ≤ now + 10d) windows. Input is due-date ascending and
/// pre-filtered to dated, active tasks.
fn partition_deadlines(
    tasks: Vec<TaskSummary>,
    urgent_until: NaiveDate,
) -> (Vec<TaskSummary>, Vec<TaskSummary>) {
    let mut urgent = Vec::new();
    let mut upcoming = Vec::new();

    for task in tasks {
        let Some(due) = task.due_date else {
            continue;
        };
        if due <= urgent_until {
            if urgent.len() < URGENT_LIMIT {
                urgent.push(task);
            }
        } else if upcoming.len() < UPCOMING_LIMIT {
            upcoming.push(task);
        }
    }

    (urgent, upcoming)
}

fn recover<T>(user: &UserId, label: &str, result: Result<Vec<T>, StoreError>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(user = %user, error = %e, "Context query failed: {label}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lodestar_core::store::{
        GoalStatus, GoalSummary, MilestoneStatus, MilestoneSummary, Priority, TaskStatus,
    };
    use std::collections::BTreeMap;

    /// Fixed-data store where each query can be switched to fail.
    #[derive(Default)]
    struct ScriptedQueries {
        fail_tasks: bool,
        fail_goals: bool,
        fail_milestones: bool,
        fail_completions: bool,
        fail_deadlines: bool,
        deadline_tasks: Vec<TaskSummary>,
    }

    fn task(id: &str, due: Option<NaiveDate>) -> TaskSummary {
        TaskSummary {
            id: id.into(),
            title: format!("Task {id}"),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            project: None,
            due_date: due,
            milestone_id: None,
        }
    }

    #[async_trait]
    impl ProductivityQueries for ScriptedQueries {
        async fn active_tasks(
            &self,
            _user: &UserId,
            _limit: usize,
        ) -> Result<Vec<TaskSummary>, StoreError> {
            if self.fail_tasks {
                return Err(StoreError::Storage("tasks query down".into()));
            }
            Ok(vec![task("t1", None), task("t2", None)])
        }

        async fn active_goals(
            &self,
            _user: &UserId,
            _limit: usize,
        ) -> Result<Vec<GoalSummary>, StoreError> {
            if self.fail_goals {
                return Err(StoreError::Storage("goals query down".into()));
            }
            Ok(vec![GoalSummary {
                id: "g1".into(),
                title: "Ship it".into(),
                status: GoalStatus::Active,
                target_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            }])
        }

        async fn active_milestones(
            &self,
            _user: &UserId,
            _limit: usize,
        ) -> Result<Vec<MilestoneSummary>, StoreError> {
            if self.fail_milestones {
                return Err(StoreError::Storage("milestones query down".into()));
            }
            Ok(vec![MilestoneSummary {
                id: "m1".into(),
                title: "Module 3".into(),
                status: MilestoneStatus::InProgress,
                progress: 40,
                target_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                goal_id: "g1".into(),
            }])
        }

        async fn completions_since(
            &self,
            _user: &UserId,
            _since: NaiveDate,
        ) -> Result<CompletionStats, StoreError> {
            if self.fail_completions {
                return Err(StoreError::Storage("completions query down".into()));
            }
            Ok(CompletionStats {
                tasks_completed: 3,
                total_minutes: 120,
            })
        }

        async fn tasks_due_through(
            &self,
            _user: &UserId,
            _horizon: NaiveDate,
            _limit: usize,
        ) -> Result<Vec<TaskSummary>, StoreError> {
            if self.fail_deadlines {
                return Err(StoreError::Storage("deadline query down".into()));
            }
            Ok(self.deadline_tasks.clone())
        }
    }

    fn now() -> DateTime<Utc> {
        // Friday 2026-08-07
        "2026-08-07T09:30:00Z".parse().unwrap()
    }

    fn user() -> UserId {
        UserId::from("user-1")
    }

    #[tokio::test]
    async fn happy_path_populates_all_fields() {
        let assembler = ContextAssembler::new(Arc::new(ScriptedQueries::default()));
        let snapshot = assembler.assemble(&user(), now()).await;

        assert_eq!(snapshot.active_tasks.len(), 2);
        assert_eq!(snapshot.active_goals.len(), 1);
        assert_eq!(snapshot.active_milestones.len(), 1);
        assert_eq!(snapshot.weekly_progress.tasks_completed, 3);
        assert_eq!(snapshot.weekly_progress.total_minutes, 120);
        assert_eq!(snapshot.today.day_of_week, "Friday");
        assert_eq!(
            snapshot.weekly_progress.week_start,
            NaiveDate::from_ymd_opt(2026, 8, 3).unwrap() // Monday
        );
        assert!(snapshot.user_profile.is_none());
    }

    #[tokio::test]
    async fn one_failing_query_leaves_the_rest_populated() {
        let assembler = ContextAssembler::new(Arc::new(ScriptedQueries {
            fail_goals: true,
            ..Default::default()
        }));
        let snapshot = assembler.assemble(&user(), now()).await;

        assert!(snapshot.active_goals.is_empty());
        assert_eq!(snapshot.active_tasks.len(), 2);
        assert_eq!(snapshot.active_milestones.len(), 1);
        assert_eq!(snapshot.weekly_progress.tasks_completed, 3);
    }

    #[tokio::test]
    async fn all_queries_failing_still_yields_a_snapshot() {
        let assembler = ContextAssembler::new(Arc::new(ScriptedQueries {
            fail_tasks: true,
            fail_goals: true,
            fail_milestones: true,
            fail_completions: true,
            fail_deadlines: true,
            ..Default::default()
        }));
        let snapshot = assembler.assemble(&user(), now()).await;

        assert!(snapshot.active_tasks.is_empty());
        assert!(snapshot.active_goals.is_empty());
        assert!(snapshot.active_milestones.is_empty());
        assert!(snapshot.urgent_deadlines.is_empty());
        assert!(snapshot.upcoming_deadlines.is_empty());
        assert_eq!(snapshot.weekly_progress.tasks_completed, 0);
        assert_eq!(snapshot.today.date, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
    }

    #[tokio::test]
    async fn deadline_windows_are_disjoint() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let deadline_tasks = vec![
            task("overdue", Some(today - Duration::days(2))),
            task("day3", Some(today + Duration::days(3))),
            task("day4", Some(today + Duration::days(4))),
            task("day10", Some(today + Duration::days(10))),
        ];
        let assembler = ContextAssembler::new(Arc::new(ScriptedQueries {
            deadline_tasks,
            ..Default::default()
        }));
        let snapshot = assembler.assemble(&user(), now()).await;

        let urgent_ids: Vec<&str> =
            snapshot.urgent_deadlines.iter().map(|t| t.id.as_str()).collect();
        let upcoming_ids: Vec<&str> = snapshot
            .upcoming_deadlines
            .iter()
            .map(|t| t.id.as_str())
            .collect();

        // Day 3 is urgent; day 4 is upcoming, never both.
        assert_eq!(urgent_ids, vec!["overdue", "day3"]);
        assert_eq!(upcoming_ids, vec!["day4", "day10"]);
        for id in &urgent_ids {
            assert!(!upcoming_ids.contains(id));
        }
    }

    #[tokio::test]
    async fn window_caps_enforced() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let mut deadline_tasks = Vec::new();
        for i in 0..30 {
            // All due tomorrow — every one urgent
            deadline_tasks.push(task(&format!("u{i}"), Some(today + Duration::days(1))));
        }
        let assembler = ContextAssembler::new(Arc::new(ScriptedQueries {
            deadline_tasks,
            ..Default::default()
        }));
        let snapshot = assembler.assemble(&user(), now()).await;
        assert_eq!(snapshot.urgent_deadlines.len(), URGENT_LIMIT);
    }

    #[tokio::test]
    async fn profile_failure_leaves_profile_absent() {
        struct FailingProfile;

        #[async_trait]
        impl ProfileSource for FailingProfile {
            async fn fetch_profile(
                &self,
                _user: &UserId,
            ) -> Result<BTreeMap<String, String>, StoreError> {
                Err(StoreError::Storage("profile service down".into()))
            }
        }

        let assembler = ContextAssembler::new(Arc::new(ScriptedQueries::default()))
            .with_profile_source(Arc::new(FailingProfile));
        let snapshot = assembler.assemble(&user(), now()).await;

        assert!(snapshot.user_profile.is_none());
        // The failure stays local — everything else is intact.
        assert_eq!(snapshot.active_tasks.len(), 2);
    }

    #[test]
    fn monday_computation() {
        // Friday → the preceding Monday
        assert_eq!(
            most_recent_monday(NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()),
            NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()
        );
        // Monday maps to itself
        assert_eq!(
            most_recent_monday(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()),
            NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()
        );
        // Sunday → six days back
        assert_eq!(
            most_recent_monday(NaiveDate::from_ymd_opt(2026, 8, 9).unwrap()),
            NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()
        );
    }
}
