//! Focus-mode scoring.
//!
//! Pure and stateless: given a task snapshot and a reference time, compute a
//! deterministic score per incomplete task and rank descending. The sort is
//! stable, so equal scores keep their input order.

use chrono::{DateTime, Utc};

use crate::model::Task;

/// Score one task at time `now`.
///
/// Components (weights carried over unchanged from the original heuristic):
/// priority weight, due-date proximity band, overdue bonus, reminder-due
/// bonus, and an age bonus so old tasks are not forgotten.
pub fn score(task: &Task, now: DateTime<Utc>) -> f64 {
    let mut score = task.priority.weight();

    if let Some(due) = task.due_date {
        let hours_until_due = (due - now).num_minutes() as f64 / 60.0;
        score += if hours_until_due < 0.0 {
            200.0 // overdue
        } else if hours_until_due < 24.0 {
            150.0
        } else if hours_until_due < 48.0 {
            100.0
        } else if hours_until_due < 72.0 {
            75.0
        } else if hours_until_due < 168.0 {
            50.0 // within a week
        } else {
            25.0
        };
    }

    if task.is_reminder_due(now) {
        score += 50.0;
    }

    // 2 points per day since creation.
    let age_days = (now - task.created_at).num_minutes() as f64 / (60.0 * 24.0);
    score += age_days * 2.0;

    score
}

/// Incomplete tasks ranked by descending score. Stable for testability:
/// ties keep the order of the input snapshot.
pub fn rank(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    let mut scored: Vec<(f64, &Task)> = tasks
        .iter()
        .filter(|t| !t.completed)
        .map(|t| (score(t, now), t))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(_, t)| t.clone()).collect()
}

/// The single highest-scoring task to focus on next, if any.
pub fn next(tasks: &[Task], now: DateTime<Utc>) -> Option<Task> {
    rank(tasks, now).into_iter().next()
}
