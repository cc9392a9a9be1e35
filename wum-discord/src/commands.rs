use serde_json::{json, Value};

const SUB_COMMAND: u8 = 1;
const OPTION_STRING: u8 = 3;
const OPTION_USER: u8 = 6;

/// Slash-command registration payloads for `/wumtodo` and `/task`.
///
/// The option names and required flags here are the single source of truth
/// the typed argument parsing in the app crate validates against.
pub fn command_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "wumtodo",
            "description": "wumtodo administration",
            "options": [
                {
                    "name": "setup",
                    "description": "Initialize wumtodo for this server",
                    "type": SUB_COMMAND,
                },
            ],
        }),
        json!({
            "name": "task",
            "description": "Task management",
            "options": [
                {
                    "name": "create",
                    "description": "Create a new task",
                    "type": SUB_COMMAND,
                    "options": [
                        { "name": "title", "description": "Task title", "type": OPTION_STRING, "required": true },
                        { "name": "description", "description": "Task details", "type": OPTION_STRING, "required": false },
                        { "name": "assignee", "description": "Assignee", "type": OPTION_USER, "required": false },
                        {
                            "name": "priority",
                            "description": "Priority",
                            "type": OPTION_STRING,
                            "required": false,
                            "choices": [
                                { "name": "High", "value": "high" },
                                { "name": "Medium", "value": "medium" },
                                { "name": "Low", "value": "low" },
                            ],
                        },
                    ],
                },
                {
                    "name": "list",
                    "description": "List tasks",
                    "type": SUB_COMMAND,
                    "options": [
                        {
                            "name": "status",
                            "description": "Filter by status",
                            "type": OPTION_STRING,
                            "required": false,
                            "choices": [
                                { "name": "To do", "value": "todo" },
                                { "name": "In progress", "value": "in_progress" },
                                { "name": "Completed", "value": "completed" },
                            ],
                        },
                        { "name": "assignee", "description": "Filter by assignee", "type": OPTION_USER, "required": false },
                    ],
                },
                {
                    "name": "status",
                    "description": "Change a task's status",
                    "type": SUB_COMMAND,
                    "options": [
                        {
                            "name": "status",
                            "description": "New status",
                            "type": OPTION_STRING,
                            "required": true,
                            "choices": [
                                { "name": "To do", "value": "todo" },
                                { "name": "In progress", "value": "in_progress" },
                                { "name": "Completed", "value": "completed" },
                            ],
                        },
                        { "name": "task_id", "description": "Task id (resolved from the thread when omitted)", "type": OPTION_STRING, "required": false },
                    ],
                },
                {
                    "name": "assign",
                    "description": "Reassign a task",
                    "type": SUB_COMMAND,
                    "options": [
                        { "name": "user", "description": "New assignee", "type": OPTION_USER, "required": true },
                        { "name": "task_id", "description": "Task id (resolved from the thread when omitted)", "type": OPTION_STRING, "required": false },
                    ],
                },
                {
                    "name": "due",
                    "description": "Set a task's due date",
                    "type": SUB_COMMAND,
                    "options": [
                        { "name": "date", "description": "Due date (YYYY-MM-DD)", "type": OPTION_STRING, "required": true },
                        { "name": "task_id", "description": "Task id (resolved from the thread when omitted)", "type": OPTION_STRING, "required": false },
                    ],
                },
                {
                    "name": "close",
                    "description": "Close a task",
                    "type": SUB_COMMAND,
                    "options": [
                        { "name": "task_id", "description": "Task id (resolved from the thread when omitted)", "type": OPTION_STRING, "required": false },
                    ],
                },
                {
                    "name": "comment",
                    "description": "Comment on a task",
                    "type": SUB_COMMAND,
                    "options": [
                        { "name": "content", "description": "Comment body", "type": OPTION_STRING, "required": true },
                        { "name": "task_id", "description": "Task id (resolved from the thread when omitted)", "type": OPTION_STRING, "required": false },
                    ],
                },
            ],
        }),
    ]
}
