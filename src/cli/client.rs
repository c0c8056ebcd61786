//! Client stub for the taskd wire protocol.
//!
//! One TCP connection, strictly one outstanding request at a time: write a
//! newline-terminated request, block until the newline-terminated response
//! arrives. No pipelining. A per-request deadline (default 30s) keeps a
//! hung server from blocking the caller forever; pass `None` to
//! `with_timeout` for the unbounded behavior.
//!
//! A timed-out request leaves the late response in flight on the socket,
//! so the client refuses further requests after a timeout — reconnect
//! instead of reusing it.

use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::trace;

use crate::ipc::protocol::{
    op, AddTaskParams, BackupParams, BackupReply, BackupsReply, BrainDumpParams, BrainDumpReply,
    CategoryParams, IdParams, PomodoroParams, PomodoroReply, PriorityParams, Request, Response,
    RestoreParams, TaskReply, TasksReply, UpdateTaskParams,
};
use crate::model::Task;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TaskClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    /// Per-request deadline. `None` means wait forever.
    timeout: Option<Duration>,
    /// Set when a request times out. The server's late reply is still
    /// buffered on the socket, so any further read would pair the stale
    /// reply with the wrong operation.
    poisoned: bool,
}

impl TaskClient {
    /// Connect to a running daemon, e.g. `TaskClient::connect("127.0.0.1:7433")`.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .context("failed to connect to taskd — is the daemon running?")?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            poisoned: false,
        })
    }

    /// Override the per-request deadline. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one operation and block for the response payload.
    ///
    /// A `success: false` envelope surfaces the server's error string as
    /// the failure.
    pub async fn call(&mut self, operation: &str, params: impl Serialize) -> Result<Value> {
        if self.poisoned {
            bail!("an earlier request timed out and its reply may still be in flight — reconnect");
        }
        let request = Request::new(operation, params).context("failed to build request")?;
        let response = match self.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, self.round_trip(&request)).await
            {
                Ok(result) => result?,
                Err(_) => {
                    self.poisoned = true;
                    bail!("{operation} timed out after {deadline:?}");
                }
            },
            None => self.round_trip(&request).await?,
        };
        match response.into_result() {
            Ok(payload) => Ok(payload),
            Err(msg) => bail!("{operation} failed: {msg}"),
        }
    }

    async fn round_trip(&mut self, request: &Request) -> Result<Response> {
        let mut line = serde_json::to_string(request).context("failed to serialize request")?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .context("failed to write request")?;
        self.writer.flush().await.context("failed to flush request")?;
        trace!(operation = %request.operation, "request sent");

        let mut response_line = String::new();
        let n = self
            .reader
            .read_line(&mut response_line)
            .await
            .context("failed to read response")?;
        if n == 0 {
            bail!("connection closed by server");
        }
        serde_json::from_str(&response_line).context("failed to parse response")
    }

    // ─── Typed operations ─────────────────────────────────────────────────────

    /// Add a task; returns the stored record with its assigned id.
    pub async fn add_task(&mut self, params: AddTaskParams) -> Result<Task> {
        let payload = self.call(op::ADD_TASK, params).await?;
        let reply: TaskReply = serde_json::from_value(payload)?;
        reply.task.context("server returned no task")
    }

    pub async fn get_task(&mut self, id: &str) -> Result<Task> {
        let payload = self.call(op::GET_TASK, IdParams { id: id.to_string() }).await?;
        let reply: TaskReply = serde_json::from_value(payload)?;
        reply.task.context("server returned no task")
    }

    pub async fn get_all_tasks(&mut self) -> Result<Vec<Task>> {
        let payload = self.call(op::GET_ALL_TASKS, Value::Null).await?;
        let reply: TasksReply = serde_json::from_value(payload)?;
        Ok(reply.tasks)
    }

    pub async fn get_tasks_by_category(&mut self, category: &str) -> Result<Vec<Task>> {
        let params = CategoryParams {
            category: category.to_string(),
        };
        let payload = self.call(op::GET_TASKS_BY_CATEGORY, params).await?;
        let reply: TasksReply = serde_json::from_value(payload)?;
        Ok(reply.tasks)
    }

    pub async fn get_tasks_by_priority(&mut self, priority: &str) -> Result<Vec<Task>> {
        let params = PriorityParams {
            priority: priority.to_string(),
        };
        let payload = self.call(op::GET_TASKS_BY_PRIORITY, params).await?;
        let reply: TasksReply = serde_json::from_value(payload)?;
        Ok(reply.tasks)
    }

    pub async fn update_task(&mut self, task: Task) -> Result<()> {
        self.call(op::UPDATE_TASK, UpdateTaskParams { task }).await?;
        Ok(())
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<()> {
        self.call(op::DELETE_TASK, IdParams { id: id.to_string() })
            .await?;
        Ok(())
    }

    /// Mark a task completed; returns the updated record.
    pub async fn complete_task(&mut self, id: &str) -> Result<Task> {
        let payload = self
            .call(op::COMPLETE_TASK, IdParams { id: id.to_string() })
            .await?;
        let reply: TaskReply = serde_json::from_value(payload)?;
        reply.task.context("server returned no task")
    }

    /// Snapshot the store into the backup directory; returns the backup path.
    pub async fn backup(&mut self, filename: Option<String>) -> Result<String> {
        let payload = self.call(op::BACKUP, BackupParams { filename }).await?;
        let reply: BackupReply = serde_json::from_value(payload)?;
        Ok(reply.filename)
    }

    /// Replace the entire collection from a backup file. Destructive.
    pub async fn restore(&mut self, filename: &str) -> Result<()> {
        let params = RestoreParams {
            filename: filename.to_string(),
        };
        self.call(op::RESTORE, params).await?;
        Ok(())
    }

    pub async fn list_backups(&mut self) -> Result<Vec<String>> {
        let payload = self.call(op::LIST_BACKUPS, Value::Null).await?;
        let reply: BackupsReply = serde_json::from_value(payload)?;
        Ok(reply.backups)
    }

    /// Add a batch of titles as inbox tasks; returns how many were added.
    pub async fn brain_dump(&mut self, titles: Vec<String>) -> Result<usize> {
        let payload = self.call(op::BRAIN_DUMP, BrainDumpParams { titles }).await?;
        let reply: BrainDumpReply = serde_json::from_value(payload)?;
        Ok(reply.added)
    }

    /// The next task to focus on, if any task is incomplete.
    pub async fn focus_mode(&mut self) -> Result<Option<Task>> {
        let payload = self.call(op::FOCUS_MODE, Value::Null).await?;
        let reply: TaskReply = serde_json::from_value(payload)?;
        Ok(reply.task)
    }

    pub async fn start_pomodoro(
        &mut self,
        task_id: &str,
        duration_secs: Option<u64>,
    ) -> Result<PomodoroReply> {
        let params = PomodoroParams {
            task_id: task_id.to_string(),
            duration_secs,
        };
        let payload = self.call(op::START_POMODORO, params).await?;
        Ok(serde_json::from_value(payload)?)
    }
}
