//! The tool catalog — the closed set of actions exposed to the model.
//!
//! `ToolName` is the single source of truth: the executor rejects anything
//! that does not parse into it, and `definitions()` derives the schema list
//! sent with the model request. The descriptions matter — they are what the
//! model uses to pick between near-duplicate actions ("create a small
//! action" vs "create a long-term objective"), so each one spells out when
//! NOT to use it.

use lodestar_core::provider::ToolDefinition;
use serde_json::json;

/// Every action the coordinator can perform on the user's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateTask,
    UpdateTask,
    DeleteTask,
    CreateGoal,
    UpdateGoal,
    ListGoals,
    CreateMilestone,
    UpdateMilestoneProgress,
    ListMilestones,
}

impl ToolName {
    pub const ALL: [ToolName; 9] = [
        ToolName::CreateTask,
        ToolName::UpdateTask,
        ToolName::DeleteTask,
        ToolName::CreateGoal,
        ToolName::UpdateGoal,
        ToolName::ListGoals,
        ToolName::CreateMilestone,
        ToolName::UpdateMilestoneProgress,
        ToolName::ListMilestones,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTask => "create_task",
            Self::UpdateTask => "update_task",
            Self::DeleteTask => "delete_task",
            Self::CreateGoal => "create_goal",
            Self::UpdateGoal => "update_goal",
            Self::ListGoals => "list_goals",
            Self::CreateMilestone => "create_milestone",
            Self::UpdateMilestoneProgress => "update_milestone_progress",
            Self::ListMilestones => "list_milestones",
        }
    }

    /// Parse a model-supplied name. Unknown names are rejected at the
    /// executor boundary — there is no open-ended dispatch.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All tool definitions, in a stable order, ready for a model request.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "create_task".into(),
            description: "Create a TASK — a small, concrete action item (\"Buy milk\", \
                \"Email the team\", \"Review notes\") that takes hours or days. \
                Do NOT use this for long-term objectives spanning weeks or months: \
                use create_goal for those, and create_milestone for checkpoints under \
                a goal. Tasks are SMALL actions; goals are BIG objectives."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Short, clear task title. Keep under 50 characters when possible."
                    },
                    "description": {
                        "type": "string",
                        "description": "Optional detail: context, notes, acceptance criteria."
                    },
                    "status": {
                        "type": "string",
                        "enum": ["pending", "in_progress", "completed"],
                        "description": "Initial status. Default: pending. Use in_progress only if the user says they are already working on it."
                    },
                    "milestone_id": {
                        "type": "string",
                        "description": "Optional id of the milestone this task advances. Look the id up in the user's context."
                    },
                    "project": {
                        "type": "string",
                        "description": "Optional project name for grouping related tasks."
                    },
                    "priority": {
                        "type": "string",
                        "enum": ["high", "medium", "low"],
                        "description": "Default: medium."
                    },
                    "due_date": {
                        "type": "string",
                        "description": "Optional due date in ISO format (YYYY-MM-DD)."
                    }
                },
                "required": ["title"]
            }),
        },
        ToolDefinition {
            name: "update_task".into(),
            description: "Update an existing task's title, description, status, or links. \
                Use when the user says things like \"mark X as done\", \"change X to in \
                progress\", or \"I finished X\" (set status completed — do NOT delete). \
                Identify task_id from the tasks in the user's context; if the task is \
                ambiguous, ask which one first instead of guessing."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "Id of the task to update, taken verbatim from the user's context."
                    },
                    "updates": {
                        "type": "object",
                        "description": "Only the fields that change.",
                        "properties": {
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "in_progress", "completed"]
                            },
                            "milestone_id": { "type": "string" },
                            "project": { "type": "string" },
                            "priority": {
                                "type": "string",
                                "enum": ["high", "medium", "low"]
                            },
                            "due_date": {
                                "type": "string",
                                "description": "ISO date (YYYY-MM-DD)."
                            }
                        }
                    }
                },
                "required": ["task_id", "updates"]
            }),
        },
        ToolDefinition {
            name: "delete_task".into(),
            description: "Delete a task permanently. Use ONLY when the user explicitly asks \
                for removal (\"delete X\", \"remove X from my list\"). If the user merely \
                completed the task, use update_task to mark it completed instead. Deletion \
                cannot be undone — if the user seems uncertain, confirm before calling."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "Id of the task to delete, taken verbatim from the user's context."
                    }
                },
                "required": ["task_id"]
            }),
        },
        ToolDefinition {
            name: "create_goal".into(),
            description: "Create a GOAL — a yearly, vision-level objective with a target \
                date (\"Secure a backend role by next fall\", \"Finish the thesis\"). Use \
                when the user describes a major objective spanning months. Do NOT use for \
                small actions (create_task) or for checkpoints under an existing goal \
                (create_milestone). Goals are broken into milestones later."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Clear goal title, 3-200 characters."
                    },
                    "target_date": {
                        "type": "string",
                        "description": "Target completion date in ISO format (YYYY-MM-DD)."
                    },
                    "description": {
                        "type": "string",
                        "description": "Optional success criteria or context."
                    },
                    "status": {
                        "type": "string",
                        "enum": ["active", "completed", "archived"],
                        "description": "Default: active."
                    }
                },
                "required": ["title", "target_date"]
            }),
        },
        ToolDefinition {
            name: "update_goal".into(),
            description: "Update an existing goal's title, description, status, or target \
                date. Use for \"push the deadline of X\", \"archive X\", \"rename X\". \
                Identify goal_id from the GOALS section of the user's context."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "goal_id": {
                        "type": "string",
                        "description": "Id of the goal to update, taken verbatim from the user's context."
                    },
                    "updates": {
                        "type": "object",
                        "description": "Only the fields that change.",
                        "properties": {
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "status": {
                                "type": "string",
                                "enum": ["active", "completed", "archived"]
                            },
                            "target_date": {
                                "type": "string",
                                "description": "ISO date (YYYY-MM-DD)."
                            }
                        }
                    }
                },
                "required": ["goal_id", "updates"]
            }),
        },
        ToolDefinition {
            name: "list_goals".into(),
            description: "List the user's goals with their ids, optionally filtered by \
                status. Use when the user asks \"what are my goals?\" or when you need a \
                goal id that is not already in the context."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["active", "completed", "archived"],
                        "description": "Optional status filter. Omit to list all goals."
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "create_milestone".into(),
            description: "Create a MILESTONE — a quarterly/monthly checkpoint under an \
                existing goal. The goal must already exist: find its id in the user's \
                context or via list_goals. If the goal does not exist yet, create it in a \
                separate turn first — a goal created earlier in the SAME batch of calls \
                cannot be referenced. To create several milestones, call this once per \
                milestone."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "goal_id": {
                        "type": "string",
                        "description": "Id of the parent goal."
                    },
                    "title": {
                        "type": "string",
                        "description": "Milestone title, 3-200 characters."
                    },
                    "target_date": {
                        "type": "string",
                        "description": "Target completion date in ISO format (YYYY-MM-DD)."
                    },
                    "description": {
                        "type": "string",
                        "description": "Optional detail."
                    },
                    "progress": {
                        "type": "integer",
                        "description": "Initial progress percentage, 0-100. Default: 0."
                    }
                },
                "required": ["goal_id", "title", "target_date"]
            }),
        },
        ToolDefinition {
            name: "update_milestone_progress".into(),
            description: "Set a milestone's progress percentage (0-100). Status follows \
                automatically: 0 = not started, 1-99 = in progress, 100 = completed. Use \
                when the user reports progress (\"module 3 is about half done\")."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "milestone_id": {
                        "type": "string",
                        "description": "Id of the milestone, taken verbatim from the user's context."
                    },
                    "progress": {
                        "type": "integer",
                        "description": "New progress percentage, 0-100."
                    }
                },
                "required": ["milestone_id", "progress"]
            }),
        },
        ToolDefinition {
            name: "list_milestones".into(),
            description: "List the user's milestones with their ids, optionally scoped to \
                one goal. Use when the user asks about checkpoints or when you need a \
                milestone id that is not already in the context."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "goal_id": {
                        "type": "string",
                        "description": "Optional goal id to scope the listing."
                    }
                },
                "required": []
            }),
        },
    ]
}
