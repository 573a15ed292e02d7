//! Snapshot rendering — the text block injected as the context system
//! message.
//!
//! Pure and stable: identical snapshots produce identical text, which the
//! golden tests below rely on. Sections appear in a fixed order and empty
//! sections are skipped (the tasks section instead renders `None`, so the
//! model always sees where tasks would be). Entity ids are printed verbatim
//! so a follow-up tool call can reference them unambiguously.

use crate::context::snapshot::ContextSnapshot;
use lodestar_core::store::{Priority, TaskSummary};
use std::fmt::Write;

/// Presentation cap for the tasks section. Independent of the assembler's
/// fetch cap — the remainder is summarized in a trailer line.
const TASK_DISPLAY_LIMIT: usize = 10;

/// Render a snapshot as the model-facing context block.
pub fn format_snapshot(snapshot: &ContextSnapshot) -> String {
    let mut out = String::new();

    // Today
    let _ = writeln!(out, "=== TODAY'S CONTEXT ===");
    let _ = writeln!(
        out,
        "Date: {} ({})",
        snapshot.today.date, snapshot.today.day_of_week
    );
    out.push('\n');

    // Weekly progress
    let _ = writeln!(out, "=== WEEKLY PROGRESS ===");
    let _ = writeln!(out, "Week starting: {}", snapshot.weekly_progress.week_start);
    let _ = writeln!(
        out,
        "Tasks completed: {}",
        snapshot.weekly_progress.tasks_completed
    );
    let _ = writeln!(
        out,
        "Time spent: {} minutes",
        snapshot.weekly_progress.total_minutes
    );
    out.push('\n');

    // Urgent deadlines
    if !snapshot.urgent_deadlines.is_empty() {
        let _ = writeln!(
            out,
            "=== URGENT DEADLINES (0-3 days) === ({} items)",
            snapshot.urgent_deadlines.len()
        );
        for task in &snapshot.urgent_deadlines {
            let _ = writeln!(out, "  [!] {} (Due: {})", task.title, due_label(task));
            if let Some(milestone_id) = &task.milestone_id {
                let _ = writeln!(out, "      -> Milestone: {milestone_id}");
            }
        }
        out.push('\n');
    }

    // Upcoming deadlines
    if !snapshot.upcoming_deadlines.is_empty() {
        let _ = writeln!(
            out,
            "=== UPCOMING DEADLINES (4-10 days) === ({} items)",
            snapshot.upcoming_deadlines.len()
        );
        for task in &snapshot.upcoming_deadlines {
            let _ = writeln!(out, "  - {} (Due: {})", task.title, due_label(task));
        }
        out.push('\n');
    }

    // Goals
    if !snapshot.active_goals.is_empty() {
        let _ = writeln!(out, "=== GOALS === ({} active)", snapshot.active_goals.len());
        for goal in &snapshot.active_goals {
            let _ = writeln!(out, "  - {} (Target: {})", goal.title, goal.target_date);
            let _ = writeln!(out, "    ID: {}", goal.id);
        }
        out.push('\n');
    }

    // Milestones
    if !snapshot.active_milestones.is_empty() {
        let _ = writeln!(
            out,
            "=== MILESTONES === ({} active)",
            snapshot.active_milestones.len()
        );
        for milestone in &snapshot.active_milestones {
            let _ = writeln!(
                out,
                "  - [{}] {} ({}% complete)",
                milestone.status.as_str(),
                milestone.title,
                milestone.progress
            );
            let _ = writeln!(out, "    ID: {}", milestone.id);
            let _ = writeln!(out, "    -> Goal: {}", milestone.goal_id);
        }
        out.push('\n');
    }

    // Tasks
    if snapshot.active_tasks.is_empty() {
        let _ = writeln!(out, "=== CURRENT TASKS === None");
        out.push('\n');
    } else {
        let _ = writeln!(
            out,
            "=== CURRENT TASKS === ({} total)",
            snapshot.active_tasks.len()
        );
        for task in snapshot.active_tasks.iter().take(TASK_DISPLAY_LIMIT) {
            let priority = if task.priority == Priority::High {
                "[HIGH] "
            } else {
                ""
            };
            let project = task
                .project
                .as_ref()
                .map(|p| format!(" [Project: {p}]"))
                .unwrap_or_default();
            let milestone = task
                .milestone_id
                .as_ref()
                .map(|m| format!(" -> Milestone: {m}"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  - {priority}{} ({}){project}{milestone}",
                task.title,
                task.status.as_str()
            );
            let _ = writeln!(out, "    ID: {}", task.id);
        }
        if snapshot.active_tasks.len() > TASK_DISPLAY_LIMIT {
            let _ = writeln!(
                out,
                "  ... and {} more tasks",
                snapshot.active_tasks.len() - TASK_DISPLAY_LIMIT
            );
        }
        out.push('\n');
    }

    // User profile
    if let Some(profile) = &snapshot.user_profile {
        if !profile.is_empty() {
            let _ = writeln!(out, "=== USER PROFILE ===");
            for (key, value) in profile {
                let _ = writeln!(out, "  - {key}: {value}");
            }
            out.push('\n');
        }
    }

    // Summary counts
    let stats = snapshot.stats();
    let _ = writeln!(out, "=== SUMMARY ===");
    let _ = writeln!(out, "Goals: {} active", stats.total_goals);
    let _ = writeln!(out, "Milestones: {} active", stats.active_milestones);
    let _ = writeln!(
        out,
        "Tasks: {} total ({} pending)",
        stats.total_tasks, stats.pending_tasks
    );
    let _ = writeln!(out, "Urgent deadlines: {}", stats.urgent_count);
    let _ = write!(out, "Upcoming deadlines: {}", stats.upcoming_count);

    out
}

fn due_label(task: &TaskSummary) -> String {
    task.due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "No date".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::snapshot::{TodayContext, WeeklySummary};
    use chrono::NaiveDate;
    use lodestar_core::identity::UserId;
    use lodestar_core::store::{
        GoalStatus, GoalSummary, MilestoneStatus, MilestoneSummary, TaskStatus,
    };
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, title: &str) -> TaskSummary {
        TaskSummary {
            id: id.into(),
            title: title.into(),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            project: None,
            due_date: None,
            milestone_id: None,
        }
    }

    fn empty_snapshot() -> ContextSnapshot {
        ContextSnapshot {
            user_id: UserId::from("u1"),
            today: TodayContext {
                date: date(2026, 8, 7),
                day_of_week: "Friday".into(),
            },
            weekly_progress: WeeklySummary {
                week_start: date(2026, 8, 3),
                tasks_completed: 0,
                total_minutes: 0,
            },
            urgent_deadlines: vec![],
            upcoming_deadlines: vec![],
            active_goals: vec![],
            active_milestones: vec![],
            active_tasks: vec![],
            user_profile: None,
        }
    }

    #[test]
    fn empty_snapshot_golden() {
        let text = format_snapshot(&empty_snapshot());
        let expected = "\
=== TODAY'S CONTEXT ===
Date: 2026-08-07 (Friday)

=== WEEKLY PROGRESS ===
Week starting: 2026-08-03
Tasks completed: 0
Time spent: 0 minutes

=== CURRENT TASKS === None

=== SUMMARY ===
Goals: 0 active
Milestones: 0 active
Tasks: 0 total (0 pending)
Urgent deadlines: 0
Upcoming deadlines: 0";
        assert_eq!(text, expected);
    }

    #[test]
    fn formatting_is_stable() {
        let mut snapshot = empty_snapshot();
        snapshot.active_tasks.push(task("t1", "Buy milk"));
        assert_eq!(format_snapshot(&snapshot), format_snapshot(&snapshot));
    }

    #[test]
    fn ids_and_cross_references_rendered_verbatim() {
        let mut snapshot = empty_snapshot();
        snapshot.active_goals.push(GoalSummary {
            id: "goal-550e8400".into(),
            title: "Land the job".into(),
            status: GoalStatus::Active,
            target_date: date(2027, 4, 1),
        });
        snapshot.active_milestones.push(MilestoneSummary {
            id: "mile-1234".into(),
            title: "Polish resume".into(),
            status: MilestoneStatus::InProgress,
            progress: 60,
            target_date: date(2026, 10, 1),
            goal_id: "goal-550e8400".into(),
        });
        let mut linked = task("task-77", "Draft bullet points");
        linked.milestone_id = Some("mile-1234".into());
        snapshot.active_tasks.push(linked);

        let text = format_snapshot(&snapshot);
        assert!(text.contains("ID: goal-550e8400"));
        assert!(text.contains("ID: mile-1234"));
        assert!(text.contains("ID: task-77"));
        assert!(text.contains("-> Goal: goal-550e8400"));
        assert!(text.contains("-> Milestone: mile-1234"));
        assert!(text.contains("[in_progress] Polish resume (60% complete)"));
    }

    #[test]
    fn tasks_capped_at_ten_with_trailer() {
        let mut snapshot = empty_snapshot();
        for i in 0..14 {
            snapshot.active_tasks.push(task(&format!("t{i}"), &format!("Task {i}")));
        }
        let text = format_snapshot(&snapshot);
        assert!(text.contains("=== CURRENT TASKS === (14 total)"));
        assert!(text.contains("- Task 9 (pending)"));
        assert!(!text.contains("- Task 10 (pending)"));
        assert!(text.contains("... and 4 more tasks"));
    }

    #[test]
    fn high_priority_flagged_and_project_shown() {
        let mut snapshot = empty_snapshot();
        let mut urgent = task("t1", "File taxes");
        urgent.priority = Priority::High;
        urgent.project = Some("Finance".into());
        snapshot.active_tasks.push(urgent);

        let text = format_snapshot(&snapshot);
        assert!(text.contains("[HIGH] File taxes (pending) [Project: Finance]"));
    }

    #[test]
    fn deadline_sections_present_only_when_populated() {
        let mut snapshot = empty_snapshot();
        let mut due_soon = task("t1", "Submit report");
        due_soon.due_date = Some(date(2026, 8, 8));
        due_soon.milestone_id = Some("m9".into());
        snapshot.urgent_deadlines.push(due_soon);

        let text = format_snapshot(&snapshot);
        assert!(text.contains("=== URGENT DEADLINES (0-3 days) === (1 items)"));
        assert!(text.contains("[!] Submit report (Due: 2026-08-08)"));
        assert!(text.contains("      -> Milestone: m9"));
        assert!(!text.contains("UPCOMING DEADLINES"));
    }

    #[test]
    fn profile_section_rendered_sorted() {
        let mut snapshot = empty_snapshot();
        let mut profile = BTreeMap::new();
        profile.insert("timezone".to_string(), "America/New_York".to_string());
        profile.insert("focus_hours".to_string(), "mornings".to_string());
        snapshot.user_profile = Some(profile);

        let text = format_snapshot(&snapshot);
        let focus_pos = text.find("focus_hours").unwrap();
        let tz_pos = text.find("timezone").unwrap();
        assert!(focus_pos < tz_pos); // BTreeMap order
        assert!(text.contains("=== USER PROFILE ==="));
    }

    #[test]
    fn section_order_is_fixed() {
        let mut snapshot = empty_snapshot();
        let mut due_soon = task("t1", "Urgent thing");
        due_soon.due_date = Some(date(2026, 8, 8));
        snapshot.urgent_deadlines.push(due_soon.clone());
        let mut later = task("t2", "Later thing");
        later.due_date = Some(date(2026, 8, 14));
        snapshot.upcoming_deadlines.push(later);
        snapshot.active_goals.push(GoalSummary {
            id: "g1".into(),
            title: "A goal".into(),
            status: GoalStatus::Active,
            target_date: date(2027, 1, 1),
        });
        snapshot.active_tasks.push(task("t3", "A task"));

        let text = format_snapshot(&snapshot);
        let positions: Vec<usize> = [
            "=== TODAY'S CONTEXT ===",
            "=== WEEKLY PROGRESS ===",
            "=== URGENT DEADLINES",
            "=== UPCOMING DEADLINES",
            "=== GOALS ===",
            "=== CURRENT TASKS ===",
            "=== SUMMARY ===",
        ]
        .iter()
        .map(|h| text.find(h).unwrap_or_else(|| panic!("missing {h}")))
        .collect();

        for pair in positions.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
