use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::model::{Priority, Task};

/// Backup file naming convention: `tasks-backup-<timestamp>.json`.
/// Lexicographic order of the names equals chronological order.
const BACKUP_PREFIX: &str = "tasks-backup-";
const BACKUP_SUFFIX: &str = ".json";

/// Errors surfaced by the task store.
///
/// `NotFound` is an ordinary, recoverable condition; the IO/serde variants
/// are fatal at startup (`initialize`) and per-request failures afterwards.
/// Callers pattern-match on the variant — there is no downcasting.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {id}")]
    NotFound { id: String },

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// File-backed task store.
///
/// In-memory map of id → task behind a single reader/writer lock, persisted
/// as a JSON array in one live file. Every mutation rewrites the whole file
/// while still holding the write lock, so persistence is atomic with
/// respect to other store operations — but not with respect to process
/// crashes: there is no write-ahead log and no atomic rename, and a crash
/// mid-write can truncate the live file. Simplicity over crash-safety.
pub struct TaskStore {
    file_path: PathBuf,
    backup_dir: PathBuf,
    tasks: RwLock<HashMap<String, Task>>,
}

impl TaskStore {
    pub fn new(file_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            backup_dir: backup_dir.into(),
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Load the live file, or create an empty one if it does not exist.
    ///
    /// Fails when the data/backup directories cannot be created, the file
    /// cannot be read, or its contents are not a valid task array. The
    /// daemon treats this as fatal — no point serving without a usable
    /// backing file.
    pub async fn initialize(&self) -> Result<()> {
        if let Some(dir) = self.file_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::create_dir_all(&self.backup_dir).await?;

        let mut tasks = self.tasks.write().await;

        match tokio::fs::read(&self.file_path).await {
            Ok(data) if data.is_empty() => {
                tasks.clear();
            }
            Ok(data) => {
                let list: Vec<Task> = serde_json::from_slice(&data)?;
                info!(count = list.len(), path = %self.file_path.display(), "loaded tasks");
                *tasks = list.into_iter().map(|t| (t.id.clone(), t)).collect();
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tasks.clear();
                Self::persist(&self.file_path, &tasks).await?;
                info!(path = %self.file_path.display(), "created empty task file");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    /// Rewrite the full collection to `path`. Called with the write lock
    /// held so no other operation can interleave.
    async fn persist(path: &Path, tasks: &HashMap<String, Task>) -> Result<()> {
        let list: Vec<&Task> = tasks.values().collect();
        let data = serde_json::to_vec_pretty(&list)?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    /// Insert or overwrite by id and persist.
    pub async fn add_task(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        debug!(id = %task.id, title = %task.title, "add task");
        tasks.insert(task.id.clone(), task);
        Self::persist(&self.file_path, &tasks).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        let tasks = self.tasks.read().await;
        tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Unordered snapshot of every task. Iteration order over the map is
    /// unspecified; callers must not rely on it.
    pub async fn get_all_tasks(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    pub async fn get_tasks_by_category(&self, category: &str) -> Vec<Task> {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| t.category == category)
            .cloned()
            .collect()
    }

    pub async fn get_tasks_by_priority(&self, priority: Priority) -> Vec<Task> {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| t.priority == priority)
            .cloned()
            .collect()
    }

    /// Replace an existing task in full and persist.
    pub async fn update_task(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&task.id) {
            return Err(StoreError::NotFound { id: task.id });
        }
        tasks.insert(task.id.clone(), task);
        Self::persist(&self.file_path, &tasks).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.remove(id).is_none() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        debug!(id, "deleted task");
        Self::persist(&self.file_path, &tasks).await
    }

    /// Fetch, flip the completed flag, write back.
    ///
    /// Two lock acquisitions — not atomic as a single store operation,
    /// acceptable because task mutation is single-writer in practice.
    pub async fn complete_task(&self, id: &str) -> Result<Task> {
        let mut task = self.get_task(id).await?;
        task.mark_complete();
        self.update_task(task.clone()).await?;
        Ok(task)
    }

    // ─── Backup & restore ─────────────────────────────────────────────────────

    /// Serialize the current snapshot to an arbitrary path. Does not touch
    /// the live file.
    pub async fn backup(&self, path: &Path) -> Result<()> {
        let tasks = self.tasks.read().await;
        let list: Vec<&Task> = tasks.values().collect();
        let data = serde_json::to_vec_pretty(&list)?;
        tokio::fs::write(path, data).await?;
        info!(count = list.len(), path = %path.display(), "wrote backup");
        Ok(())
    }

    /// Write a snapshot into the backup directory under the timestamped
    /// naming convention (or `filename` when the caller supplies one).
    /// Returns the full path of the new backup file.
    pub async fn backup_to_dir(&self, filename: Option<&str>) -> Result<PathBuf> {
        let name = match filename {
            Some(f) if !f.is_empty() => f.to_string(),
            _ => backup_file_name(Utc::now()),
        };
        let path = self.backup_dir.join(name);
        self.backup(&path).await?;
        Ok(path)
    }

    /// Backup files in the backup directory matching the naming convention,
    /// sorted by name — which is chronological order.
    pub async fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.backup_dir).await?;
        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX) {
                backups.push(entry.path());
            }
        }
        backups.sort();
        Ok(backups)
    }

    /// Read a snapshot from `path` and replace the entire in-memory
    /// collection with it — destructive, no merge — then persist the new
    /// collection to the live file.
    pub async fn restore(&self, path: &Path) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        let list: Vec<Task> = serde_json::from_slice(&data)?;

        let mut tasks = self.tasks.write().await;
        *tasks = list.into_iter().map(|t| (t.id.clone(), t)).collect();
        info!(count = tasks.len(), path = %path.display(), "restored from backup");
        Self::persist(&self.file_path, &tasks).await
    }
}

/// Deterministic backup name for a capture timestamp.
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!(
        "{BACKUP_PREFIX}{}{BACKUP_SUFFIX}",
        at.format("%Y%m%d-%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn backup_names_are_deterministic_and_sortable() {
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 1).unwrap();
        let n1 = backup_file_name(t1);
        let n2 = backup_file_name(t2);
        assert_eq!(n1, "tasks-backup-20260301-093000.json");
        assert!(n1 < n2);
    }

    #[tokio::test]
    async fn initialize_tolerates_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tasks.json");
        std::fs::write(&file, b"").unwrap();

        let store = TaskStore::new(&file, dir.path().join("backups"));
        store.initialize().await.unwrap();
        assert!(store.get_all_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn initialize_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tasks.json");
        std::fs::write(&file, b"not json").unwrap();

        let store = TaskStore::new(&file, dir.path().join("backups"));
        let err = store.initialize().await.unwrap_err();
        assert!(matches!(err, StoreError::Serde(_)));
    }
}
