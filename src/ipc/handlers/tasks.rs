//! Task CRUD handlers.

use serde_json::Value;

use super::{parse, reply};
use crate::ipc::protocol::{
    op, AddTaskParams, CategoryParams, IdParams, PriorityParams, TaskReply, TasksReply,
    UpdateTaskParams,
};
use crate::ipc::OpError;
use crate::model::{Priority, Task};
use crate::AppContext;

pub async fn add(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: AddTaskParams = parse(op::ADD_TASK, params)?;

    let title = p.title.trim();
    if title.is_empty() {
        return Err(OpError::Validation("title must not be empty".to_string()));
    }
    let priority: Priority = p
        .priority
        .parse()
        .map_err(|e: crate::model::InvalidPriority| OpError::Validation(e.to_string()))?;
    let category = if p.category.is_empty() {
        ctx.config.default_category.clone()
    } else {
        p.category
    };

    let task = Task::new(
        title,
        p.description,
        priority,
        category,
        p.due_date,
        p.reminder_at,
    );
    ctx.store.add_task(task.clone()).await?;
    reply(TaskReply { task: Some(task) })
}

pub async fn get(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: IdParams = parse(op::GET_TASK, params)?;
    let task = ctx.store.get_task(&p.id).await?;
    reply(TaskReply { task: Some(task) })
}

pub async fn get_all(_params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let tasks = ctx.store.get_all_tasks().await;
    reply(TasksReply { tasks })
}

pub async fn by_category(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: CategoryParams = parse(op::GET_TASKS_BY_CATEGORY, params)?;
    let tasks = ctx.store.get_tasks_by_category(&p.category).await;
    reply(TasksReply { tasks })
}

pub async fn by_priority(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: PriorityParams = parse(op::GET_TASKS_BY_PRIORITY, params)?;
    let priority: Priority = p
        .priority
        .parse()
        .map_err(|e: crate::model::InvalidPriority| OpError::Validation(e.to_string()))?;
    let tasks = ctx.store.get_tasks_by_priority(priority).await;
    reply(TasksReply { tasks })
}

pub async fn update(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: UpdateTaskParams = parse(op::UPDATE_TASK, params)?;
    if p.task.title.trim().is_empty() {
        return Err(OpError::Validation("title must not be empty".to_string()));
    }
    ctx.store.update_task(p.task).await?;
    Ok(Value::Null)
}

pub async fn delete(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: IdParams = parse(op::DELETE_TASK, params)?;
    ctx.store.delete_task(&p.id).await?;
    Ok(Value::Null)
}

pub async fn complete(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: IdParams = parse(op::COMPLETE_TASK, params)?;
    let task = ctx.store.complete_task(&p.id).await?;
    reply(TaskReply { task: Some(task) })
}
