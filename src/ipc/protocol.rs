//! Wire protocol: newline-delimited JSON over TCP.
//!
//! Each frame is one JSON document followed by `\n` — no length prefix, so
//! payloads must not contain raw newlines (serde_json never emits them).
//! The envelope is shared by server and client; per-operation payload
//! shapes live alongside it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Task;

/// Operation names carried in the request envelope.
pub mod op {
    pub const ADD_TASK: &str = "ADD_TASK";
    pub const GET_TASK: &str = "GET_TASK";
    pub const GET_ALL_TASKS: &str = "GET_ALL_TASKS";
    pub const GET_TASKS_BY_CATEGORY: &str = "GET_TASKS_BY_CATEGORY";
    pub const GET_TASKS_BY_PRIORITY: &str = "GET_TASKS_BY_PRIORITY";
    pub const UPDATE_TASK: &str = "UPDATE_TASK";
    pub const DELETE_TASK: &str = "DELETE_TASK";
    pub const COMPLETE_TASK: &str = "COMPLETE_TASK";

    pub const BACKUP: &str = "BACKUP";
    pub const RESTORE: &str = "RESTORE";
    pub const LIST_BACKUPS: &str = "LIST_BACKUPS";

    pub const BRAIN_DUMP: &str = "BRAIN_DUMP";
    pub const FOCUS_MODE: &str = "FOCUS_MODE";
    pub const START_POMODORO: &str = "START_POMODORO";
}

/// Request envelope. `payload` defaults to null for operations that take
/// no parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub operation: String,
    #[serde(default)]
    pub payload: Value,
}

impl Request {
    pub fn new(operation: impl Into<String>, payload: impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            operation: operation.into(),
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn empty(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            payload: Value::Null,
        }
    }
}

/// Response envelope. `error` is present only on failure, `payload` only
/// when the operation produced one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Response {
    pub fn ok(payload: impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            success: true,
            error: None,
            payload: Some(serde_json::to_value(payload)?),
        })
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            error: None,
            payload: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            payload: None,
        }
    }

    /// The payload on success, or the server's error string as a failure.
    pub fn into_result(self) -> Result<Value, String> {
        if self.success {
            Ok(self.payload.unwrap_or(Value::Null))
        } else {
            Err(self.error.unwrap_or_else(|| "unknown error".to_string()))
        }
    }
}

// ─── Per-operation payload shapes ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTaskParams {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Parsed against `Priority` at the boundary; a bad value is a
    /// validation failure, not a storage one.
    pub priority: String,
    /// Empty or missing → the server's default category.
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdParams {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryParams {
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityParams {
    pub priority: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskParams {
    pub task: Task,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreParams {
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainDumpParams {
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroParams {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

// ─── Reply shapes ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReply {
    pub task: Option<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksReply {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReply {
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupsReply {
    pub backups: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainDumpReply {
    pub added: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroReply {
    pub task_id: String,
    pub title: String,
    pub duration_secs: u64,
}
