use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Importance level of a task. Serialized lowercase on the wire and on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Weight used by focus scoring.
    pub fn weight(self) -> f64 {
        match self {
            Priority::High => 100.0,
            Priority::Medium => 50.0,
            Priority::Low => 25.0,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(InvalidPriority(other.to_string())),
        }
    }
}

/// Rejected priority string — caught at the boundary, never reaches the store.
#[derive(Debug, thiserror::Error)]
#[error("invalid priority '{0}' — expected low, medium, or high")]
pub struct InvalidPriority(pub String);

/// A single to-do item.
///
/// The store is the sole owner of task records; callers get clones and
/// route every mutation through store operations to stay durable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// ULID string. The timestamp prefix keeps ids sortable by creation
    /// time; the random suffix keeps concurrent creation collision-free.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    /// Set once at creation, immutable thereafter.
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task with a fresh id and `created_at = now`.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        category: impl Into<String>,
        due_date: Option<DateTime<Utc>>,
        reminder_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Ulid::new().to_string(),
            title: title.into(),
            description: description.into(),
            priority,
            category: category.into(),
            due_date,
            completed: false,
            created_at: Utc::now(),
            reminder_at,
        }
    }

    /// Past its due date and not yet completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.due_date, Some(due) if now > due) && !self.completed
    }

    /// Reminder time has passed and the task is not yet completed.
    pub fn is_reminder_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.reminder_at, Some(at) if now > at) && !self.completed
    }

    pub fn mark_complete(&mut self) {
        self.completed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn priority_parses_and_rejects() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        // case-sensitive, matching the wire format
        assert!("High".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_round_trips_through_json() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"high\"");
        let back: Priority = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Priority::High);
    }

    #[test]
    fn new_tasks_start_incomplete_with_distinct_ids() {
        let a = Task::new("one", "", Priority::Medium, "inbox", None, None);
        let b = Task::new("two", "", Priority::Medium, "inbox", None, None);
        assert!(!a.completed);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn overdue_and_reminder_checks() {
        let now = Utc::now();
        let mut task = Task::new(
            "t",
            "",
            Priority::Low,
            "inbox",
            Some(now - Duration::hours(1)),
            Some(now - Duration::minutes(5)),
        );
        assert!(task.is_overdue(now));
        assert!(task.is_reminder_due(now));

        task.mark_complete();
        assert!(!task.is_overdue(now));
        assert!(!task.is_reminder_due(now));

        let future = Task::new(
            "f",
            "",
            Priority::Low,
            "inbox",
            Some(now + Duration::hours(1)),
            None,
        );
        assert!(!future.is_overdue(now));
        assert!(!future.is_reminder_due(now));
    }

    #[test]
    fn optional_dates_are_omitted_from_json() {
        let task = Task::new("t", "", Priority::Low, "inbox", None, None);
        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("due_date"));
        assert!(!json.contains("reminder_at"));
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
