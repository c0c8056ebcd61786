//! Backup / restore handlers.

use std::path::PathBuf;

use serde_json::Value;

use super::{parse, reply};
use crate::ipc::protocol::{op, BackupParams, BackupReply, BackupsReply, RestoreParams};
use crate::ipc::OpError;
use crate::AppContext;

pub async fn backup(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: BackupParams = parse(op::BACKUP, params)?;
    let path = ctx.store.backup_to_dir(p.filename.as_deref()).await?;
    reply(BackupReply {
        filename: path.display().to_string(),
    })
}

pub async fn restore(params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let p: RestoreParams = parse(op::RESTORE, params)?;
    if p.filename.is_empty() {
        return Err(OpError::Validation("filename must not be empty".to_string()));
    }
    // Bare names resolve inside the backup directory; anything with a
    // directory component is taken as a path.
    let path = PathBuf::from(&p.filename);
    let path = if path.components().count() == 1 {
        ctx.config.backup_dir().join(path)
    } else {
        path
    };
    ctx.store.restore(&path).await?;
    Ok(Value::Null)
}

pub async fn list_backups(_params: Value, ctx: &AppContext) -> Result<Value, OpError> {
    let backups = ctx
        .store
        .list_backups()
        .await?
        .into_iter()
        .map(|p| p.display().to_string())
        .collect();
    reply(BackupsReply { backups })
}
