//! Task store tests: CRUD, persistence, backup/restore, concurrency.

use std::collections::HashSet;
use std::sync::Arc;

use taskd::model::{Priority, Task};
use taskd::store::{StoreError, TaskStore};

fn new_store(dir: &std::path::Path) -> TaskStore {
    TaskStore::new(dir.join("tasks.json"), dir.join("backups"))
}

fn task(title: &str, priority: Priority, category: &str) -> Task {
    Task::new(title, "some description", priority, category, None, None)
}

#[tokio::test]
async fn added_task_fetches_back_field_for_field() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();

    let t = task("Buy milk", Priority::Medium, "inbox");
    store.add_task(t.clone()).await.unwrap();

    let fetched = store.get_task(&t.id).await.unwrap();
    assert_eq!(fetched, t);
}

#[tokio::test]
async fn missing_ids_fail_with_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();

    let err = store.get_task("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { ref id } if id == "nope"));

    let err = store.delete_task("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let ghost = task("ghost", Priority::Low, "inbox");
    let err = store.update_task(ghost).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn delete_removes_from_all_subsequent_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();

    let a = task("a", Priority::Low, "inbox");
    let b = task("b", Priority::Low, "inbox");
    store.add_task(a.clone()).await.unwrap();
    store.add_task(b.clone()).await.unwrap();

    store.delete_task(&a.id).await.unwrap();
    let all = store.get_all_tasks().await;
    assert_eq!(all.len(), 1);
    assert!(all.iter().all(|t| t.id != a.id));
}

#[tokio::test]
async fn filters_by_category_and_priority() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();

    store.add_task(task("w1", Priority::High, "work")).await.unwrap();
    store.add_task(task("w2", Priority::Low, "work")).await.unwrap();
    store.add_task(task("p1", Priority::High, "personal")).await.unwrap();

    assert_eq!(store.get_tasks_by_category("work").await.len(), 2);
    assert_eq!(store.get_tasks_by_category("personal").await.len(), 1);
    assert!(store.get_tasks_by_category("missing").await.is_empty());

    assert_eq!(store.get_tasks_by_priority(Priority::High).await.len(), 2);
    assert!(store.get_tasks_by_priority(Priority::Medium).await.is_empty());
}

#[tokio::test]
async fn complete_flips_the_flag_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();

    let t = task("finish report", Priority::High, "work");
    store.add_task(t.clone()).await.unwrap();
    assert!(!store.get_task(&t.id).await.unwrap().completed);

    let done = store.complete_task(&t.id).await.unwrap();
    assert!(done.completed);
    assert!(store.get_task(&t.id).await.unwrap().completed);
}

#[tokio::test]
async fn tasks_survive_a_store_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let t = task("persisted", Priority::Medium, "inbox");
    {
        let store = new_store(dir.path());
        store.initialize().await.unwrap();
        store.add_task(t.clone()).await.unwrap();
    }

    let store = new_store(dir.path());
    store.initialize().await.unwrap();
    assert_eq!(store.get_task(&t.id).await.unwrap(), t);
}

#[tokio::test]
async fn backup_restore_round_trip_survives_intervening_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();

    let keep_a = task("keep a", Priority::Low, "inbox");
    let keep_b = task("keep b", Priority::High, "work");
    store.add_task(keep_a.clone()).await.unwrap();
    store.add_task(keep_b.clone()).await.unwrap();

    let backup = store.backup_to_dir(None).await.unwrap();

    // Writes after the backup: one add, one delete.
    store.add_task(task("later", Priority::Medium, "inbox")).await.unwrap();
    store.delete_task(&keep_a.id).await.unwrap();

    store.restore(&backup).await.unwrap();

    let mut ids: Vec<String> = store.get_all_tasks().await.into_iter().map(|t| t.id).collect();
    ids.sort();
    let mut expected = vec![keep_a.id.clone(), keep_b.id.clone()];
    expected.sort();
    // Equal as a set: the collection at backup time, nothing more.
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn restore_is_destructive() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();

    let backup = store.backup_to_dir(Some("empty.json")).await.unwrap();
    let added_after = task("added after backup", Priority::Low, "inbox");
    store.add_task(added_after.clone()).await.unwrap();

    store.restore(&backup).await.unwrap();
    assert!(store.get_all_tasks().await.is_empty());
    assert!(matches!(
        store.get_task(&added_after.id).await.unwrap_err(),
        StoreError::NotFound { .. }
    ));
}

#[tokio::test]
async fn backup_does_not_touch_the_live_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();
    store.add_task(task("t", Priority::Low, "inbox")).await.unwrap();

    let live_before = std::fs::read(dir.path().join("tasks.json")).unwrap();
    store.backup_to_dir(None).await.unwrap();
    let live_after = std::fs::read(dir.path().join("tasks.json")).unwrap();
    assert_eq!(live_before, live_after);
}

#[tokio::test]
async fn list_backups_is_sorted_and_ignores_strangers() {
    let dir = tempfile::tempdir().unwrap();
    let store = new_store(dir.path());
    store.initialize().await.unwrap();

    store
        .backup_to_dir(Some("tasks-backup-20260101-000000.json"))
        .await
        .unwrap();
    store
        .backup_to_dir(Some("tasks-backup-20250101-000000.json"))
        .await
        .unwrap();
    // Not matching the naming convention — must not be listed.
    std::fs::write(dir.path().join("backups").join("notes.txt"), b"x").unwrap();

    let backups = store.list_backups().await.unwrap();
    assert_eq!(backups.len(), 2);
    assert!(backups[0].ends_with("tasks-backup-20250101-000000.json"));
    assert!(backups[1].ends_with("tasks-backup-20260101-000000.json"));
}

#[tokio::test]
async fn concurrent_adds_all_land_with_distinct_ids() {
    const N: usize = 32;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(new_store(dir.path()));
    store.initialize().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..N {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .add_task(task(&format!("task {i}"), Priority::Medium, "inbox"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let all = store.get_all_tasks().await;
    assert_eq!(all.len(), N);
    let ids: HashSet<String> = all.into_iter().map(|t| t.id).collect();
    // An id collision would be a bug in id generation.
    assert_eq!(ids.len(), N);

    // And the live file agrees after a reopen.
    let reopened = new_store(dir.path());
    reopened.initialize().await.unwrap();
    assert_eq!(reopened.get_all_tasks().await.len(), N);
}
