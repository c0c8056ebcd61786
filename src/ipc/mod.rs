pub mod handlers;
pub mod protocol;

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::store::StoreError;
use crate::AppContext;
use protocol::{op, Request, Response};

// ─── Operation errors ─────────────────────────────────────────────────────────

/// Failure of a single dispatched operation.
///
/// Every variant maps to a `success: false` response — none of them ever
/// terminates the connection or the process. The variants are the error
/// taxonomy of the protocol; callers and tests match on them rather than
/// inspecting strings.
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error("task not found: {id}")]
    NotFound { id: String },

    /// Invalid field values (empty title, bad priority) caught at the
    /// boundary before reaching the store.
    #[error("{0}")]
    Validation(String),

    /// Payload did not parse against the operation's expected shape.
    #[error("invalid payload for {operation}: {source}")]
    InvalidParams {
        operation: &'static str,
        source: serde_json::Error,
    },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// File IO or (de)serialization failure inside the store. Recoverable
    /// per-request — the server keeps running.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for OpError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => OpError::NotFound { id },
            other => OpError::Storage(other),
        }
    }
}

// ─── Server ──────────────────────────────────────────────────────────────────

/// Bind the TCP listener and serve until a shutdown signal arrives.
///
/// Closing the listener is the whole of graceful shutdown: in-flight
/// connections are not forcibly terminated and run until their next IO
/// error or EOF.
pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "taskd listening");

    let shutdown = make_shutdown_future();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("shutdown signal received — closing listener");
                break;
            }

            conn = listener.accept() => {
                let (stream, peer) = match conn {
                    Ok(c) => c,
                    Err(e) => {
                        error!(err = %e, "accept error");
                        continue;
                    }
                };
                debug!(peer = %peer, "new connection");
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, ctx).await {
                        warn!(peer = %peer, err = %e, "connection error");
                    }
                });
            }
        }
    }

    info!("server stopped");
    Ok(())
}

/// Returns a future that resolves when a shutdown signal is received.
///
/// On Unix we listen for SIGTERM *and* Ctrl-C.
/// On other platforms we listen for Ctrl-C only.
async fn make_shutdown_future() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}

/// One request/dispatch/response cycle per line until EOF or an IO error.
///
/// Malformed lines and failed operations produce `success: false` responses
/// and the loop keeps reading — the connection only closes on IO failure.
async fn handle_connection(stream: TcpStream, ctx: Arc<AppContext>) -> Result<()> {
    let peer = stream.peer_addr()?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut frame = Vec::new();

    loop {
        frame.clear();
        if reader.read_until(b'\n', &mut frame).await? == 0 {
            break;
        }
        // Frames are raw bytes until proven otherwise: invalid UTF-8 must
        // yield a failure response like any other malformed envelope, not
        // close the connection.
        let line = String::from_utf8_lossy(&frame);
        let response = dispatch_line(line.trim_end(), &ctx).await;
        let mut data = serde_json::to_vec(&response)?;
        data.push(b'\n');
        writer.write_all(&data).await?;
    }

    debug!(peer = %peer, "client disconnected");
    Ok(())
}

/// Parse one request line and dispatch it. Never fails — every error
/// becomes a failure response.
pub async fn dispatch_line(line: &str, ctx: &AppContext) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            debug!(err = %e, "malformed request envelope");
            return Response::failure(format!("invalid request: {e}"));
        }
    };

    debug!(operation = %request.operation, "dispatch");

    match dispatch(&request.operation, request.payload, ctx).await {
        Ok(Value::Null) => Response::ok_empty(),
        Ok(value) => Response {
            success: true,
            error: None,
            payload: Some(value),
        },
        Err(e) => {
            if let OpError::Storage(ref err) = e {
                error!(operation = %request.operation, err = %err, "storage failure");
            }
            Response::failure(e.to_string())
        }
    }
}

/// Resolve an operation name to its handler.
async fn dispatch(operation: &str, params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    match operation {
        op::ADD_TASK => handlers::tasks::add(params, ctx).await,
        op::GET_TASK => handlers::tasks::get(params, ctx).await,
        op::GET_ALL_TASKS => handlers::tasks::get_all(params, ctx).await,
        op::GET_TASKS_BY_CATEGORY => handlers::tasks::by_category(params, ctx).await,
        op::GET_TASKS_BY_PRIORITY => handlers::tasks::by_priority(params, ctx).await,
        op::UPDATE_TASK => handlers::tasks::update(params, ctx).await,
        op::DELETE_TASK => handlers::tasks::delete(params, ctx).await,
        op::COMPLETE_TASK => handlers::tasks::complete(params, ctx).await,
        op::BACKUP => handlers::data::backup(params, ctx).await,
        op::RESTORE => handlers::data::restore(params, ctx).await,
        op::LIST_BACKUPS => handlers::data::list_backups(params, ctx).await,
        op::BRAIN_DUMP => handlers::focus::brain_dump(params, ctx).await,
        op::FOCUS_MODE => handlers::focus::focus_mode(params, ctx).await,
        op::START_POMODORO => handlers::focus::start_pomodoro(params, ctx).await,
        unknown => Err(OpError::UnknownOperation(unknown.to_string())),
    }
}
