//! Brain dump, focus mode, and pomodoro handlers.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::{parse, reply};
use crate::focus;
use crate::ipc::protocol::{
    op, BrainDumpParams, BrainDumpReply, PomodoroParams, PomodoroReply, TaskReply,
};
use crate::ipc::OpError;
use crate::model::{Priority, Task};
use crate::AppContext;

/// Default pomodoro work duration: 25 minutes.
const DEFAULT_POMODORO_SECS: u64 = 25 * 60;

/// Insert each non-empty title as a medium-priority task in the default
/// category. The interactive capture loop lives client-side; the wire op
/// only takes the batch.
pub async fn brain_dump(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: BrainDumpParams = parse(op::BRAIN_DUMP, params)?;

    let mut added = 0;
    for title in &p.titles {
        let title = title.trim();
        if title.is_empty() {
            continue;
        }
        let task = Task::new(
            title,
            "",
            Priority::Medium,
            ctx.config.default_category.clone(),
            None,
            None,
        );
        ctx.store.add_task(task).await?;
        added += 1;
    }
    debug!(added, "brain dump");
    reply(BrainDumpReply { added })
}

/// The single highest-scoring incomplete task, or `task: null` when
/// everything is done.
pub async fn focus_mode(_params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let tasks = ctx.store.get_all_tasks().await;
    let task = focus::next(&tasks, Utc::now());
    reply(TaskReply { task })
}

/// Validate the task and resolve the work duration. The countdown itself
/// is a client-side concern; the server only acknowledges.
pub async fn start_pomodoro(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: PomodoroParams = parse(op::START_POMODORO, params)?;
    let task = ctx.store.get_task(&p.task_id).await?;
    let duration_secs = match p.duration_secs {
        Some(0) | None => DEFAULT_POMODORO_SECS,
        Some(secs) => secs,
    };
    reply(PomodoroReply {
        task_id: task.id,
        title: task.title,
        duration_secs,
    })
}
