//! This module provides a client-side cache of the task list, with optimistic updates
//!
//! Local changes are applied to the cache at once, before the remote store confirms them, so that a view can
//! display them immediately. A failed remote change is *not* reverted: the cached task keeps the local version,
//! is marked as [`SyncStatus::Failed`], and the failure is returned to the caller.
//!
//! The cache only converges to the remote truth on an explicit [`TaskBoard::refresh`]. There is no timer in here:
//! polling belongs to whatever drives the view.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Schema;
use crate::error::{Error, StoreError};
use crate::page::RawPage;
use crate::partition::{partition, WeekBoard};
use crate::query::{sort_by_date_nulls_first, Query};
use crate::task::{normalize_tasks, NewTask, Task, TaskPatch};
use crate::traits::RemoteStore;


/// Describes whether a cached task is what the store returned, or has been modified locally since then
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// As fetched at the last refresh
    Synced,
    /// Locally modified, the store has not answered yet
    LocallyModified,
    /// Locally modified, and the store accepted the change. The next refresh will tell the final word.
    Confirmed,
    /// Locally modified, but the store rejected the change. The local version is still displayed.
    Failed(StoreError),
}

#[derive(Clone, Debug, PartialEq)]
struct CachedTask {
    task: Task,
    sync_status: SyncStatus,
}

impl CachedTask {
    fn synced(task: Task) -> Self {
        Self { task, sync_status: SyncStatus::Synced }
    }
}


/// The last fetched task list, and the local changes made since then
pub struct TaskBoard<S: RemoteStore> {
    store: S,
    schema: Schema,
    tasks: Vec<CachedTask>,
    last_refresh: Option<DateTime<Utc>>,
}

impl<S: RemoteStore> TaskBoard<S> {
    /// Create an empty board. Nothing is fetched until [`Self::refresh`] is called
    pub fn new(store: S, schema: Schema) -> Self {
        Self { store, schema, tasks: Vec::new(), last_refresh: None }
    }

    pub fn store(&self) -> &S { &self.store }
    pub fn store_mut(&mut self) -> &mut S { &mut self.store }
    pub fn schema(&self) -> &Schema { &self.schema }

    /// Returns the last time the board was successfully refreshed (or None in case it has never been)
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Replace the cache with the active tasks of the store.
    ///
    /// Local changes are dropped, whatever their status. In case of error, the cache is left untouched.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.refresh_with(None).await
    }

    /// Replace the cache with the active tasks of a single day (this is what the focus view displays)
    pub async fn refresh_for(&mut self, date: NaiveDate) -> Result<(), Error> {
        self.refresh_with(Some(date)).await
    }

    async fn refresh_with(&mut self, target: Option<NaiveDate>) -> Result<(), Error> {
        let mut query = Query::active_tasks(&self.schema, target);
        let mut results: Vec<Value> = Vec::new();
        let mut seen_cursors: HashSet<String> = HashSet::new();
        loop {
            let response = match self.store.query(&query).await {
                Ok(response) => response,
                Err(err) => {
                    log::warn!("Unable to refresh the task list: {}. Keeping the previous one", err);
                    return Err(err.into());
                }
            };
            results.extend(response.results);
            match response.next_cursor {
                Some(cursor) if response.has_more => {
                    if seen_cursors.insert(cursor.clone()) == false {
                        log::warn!("The store returned cursor {} twice. Stopping pagination", cursor);
                        break;
                    }
                    query = query.starting_at(cursor);
                },
                _ => break,
            }
        }

        let mut tasks = normalize_tasks(&results, &self.schema);
        sort_by_date_nulls_first(&mut tasks);
        log::info!("Fetched {} task(s) ({} record(s) ignored)", tasks.len(), results.len() - tasks.len());

        self.tasks = tasks.into_iter().map(CachedTask::synced).collect();
        self.last_refresh = Some(Utc::now());
        Ok(())
    }

    /// Returns the cached tasks, undated ones first, then by ascending date
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().map(|cached| &cached.task)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.position(id).map(|index| &self.tasks[index].task)
    }

    pub fn sync_status(&self, id: &str) -> Option<&SyncStatus> {
        self.position(id).map(|index| &self.tasks[index].sync_status)
    }

    /// Whether some local changes have been rejected by the store, so that the cache cannot be trusted until the next refresh
    pub fn needs_refresh(&self) -> bool {
        self.tasks.iter().any(|cached| matches!(cached.sync_status, SyncStatus::Failed(_)))
    }

    /// The kanban board of the week `reference` belongs to
    pub fn week(&self, reference: NaiveDate) -> WeekBoard {
        let tasks: Vec<Task> = self.tasks().cloned().collect();
        partition(&tasks, reference)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|cached| cached.task.id() == id)
    }

    /// Merge `patch` into the cached task at once.
    ///
    /// Patches are applied in call order, so a later patch overwrites the fields an earlier one touched.
    /// Returns `false` (and does nothing) in case no cached task has this id: the cache only ever reflects fetched tasks.
    pub fn apply_local_update(&mut self, id: &str, patch: &TaskPatch) -> bool {
        let index = match self.position(id) {
            None => {
                log::debug!("Task {} is not cached, ignoring a local update", id);
                return false;
            },
            Some(index) => index,
        };

        let cached = &mut self.tasks[index];
        cached.task.apply(patch);
        cached.sync_status = SyncStatus::LocallyModified;
        if patch.date.is_some() {
            self.resort();
        }
        true
    }

    /// Record the answer of the store to a local change.
    ///
    /// On success, the local version stays (it is considered authoritative until the next refresh).
    /// On failure, the local version stays as well, the task is marked as failed, and the error is returned.
    /// This never changes the fields of the cached task, so a late answer cannot overwrite a newer refresh.
    pub fn confirm_update<T>(&mut self, id: &str, remote_result: Result<T, StoreError>) -> Result<(), Error> {
        let index = self.position(id);

        match remote_result {
            Ok(_) => {
                if let Some(index) = index {
                    let cached = &mut self.tasks[index];
                    if cached.sync_status == SyncStatus::LocallyModified {
                        cached.sync_status = SyncStatus::Confirmed;
                    } else {
                        log::debug!("Task {} has been refreshed since it was modified ({:?})", id, cached.sync_status);
                    }
                }
                Ok(())
            },
            Err(err) => {
                log::warn!("The store rejected a change of task {}: {}", id, err);
                if let Some(index) = index {
                    let cached = &mut self.tasks[index];
                    if cached.sync_status != SyncStatus::Synced {
                        cached.sync_status = SyncStatus::Failed(err.clone());
                    }
                }
                Err(err.into())
            },
        }
    }

    /// Drop a task from the cache at once. Returns it, in case it was cached
    pub fn remove_local(&mut self, id: &str) -> Option<Task> {
        let index = self.position(id)?;
        Some(self.tasks.remove(index).task)
    }

    /// Update a task: locally first, then in the store
    pub async fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<(), Error> {
        if id.is_empty() {
            return Err(Error::MissingInput("task id"));
        }
        if patch.is_empty() {
            log::debug!("Nothing to update for task {}", id);
            return Ok(());
        }

        self.apply_local_update(id, patch);
        let properties = patch.to_properties(&self.schema);
        let result = self.store.update_page(id, &properties).await;
        self.confirm_update(id, result)
    }

    /// Delete a task: locally first, then in the store.
    ///
    /// The task is not put back into the cache in case the store fails.
    pub async fn delete_task(&mut self, id: &str) -> Result<(), Error> {
        if id.is_empty() {
            return Err(Error::MissingInput("task id"));
        }

        if self.remove_local(id).is_none() {
            log::debug!("Task {} is not cached, deleting it remotely only", id);
        }
        if let Err(err) = self.store.archive_page(id).await {
            log::warn!("Unable to delete task {}: {}", id, err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Create a task in the store, and add it to the cache
    pub async fn create_task(&mut self, new_task: &NewTask) -> Result<Task, Error> {
        let properties = new_task.to_properties(&self.schema);
        let page = self.store.create_page(&properties).await?;

        let raw_page = RawPage::from_value(&page)
            .ok_or_else(|| StoreError::with_detail("The store returned an invalid page", page.to_string()))?;
        let task = Task::from_page(&raw_page, &self.schema);
        log::info!("Created task {} ({})", task.name(), task.id());

        self.tasks.push(CachedTask::synced(task.clone()));
        self.resort();
        Ok(task)
    }

    fn resort(&mut self) {
        // Stable: same-day tasks keep their relative order
        self.tasks.sort_by_key(|cached| cached.task.date());
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::memory_store::MemoryStore;
    use crate::property::PropertyBag;
    use crate::query::QueryResponse;

    fn ymd(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 6, d)
    }

    fn board_with(tasks: &[Task]) -> TaskBoard<MemoryStore> {
        let mut board = TaskBoard::new(MemoryStore::new(), Schema::default());
        board.tasks = tasks.iter().cloned().map(CachedTask::synced).collect();
        board
    }

    #[test]
    fn unknown_id_is_a_no_op() {
        let mut board = board_with(&[Task::new("xyz", "Call Mom", None)]);
        let before: Vec<Task> = board.tasks().cloned().collect();

        assert_eq!(board.apply_local_update("abc", &TaskPatch::state("Done")), false);

        let after: Vec<Task> = board.tasks().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(board.sync_status("xyz"), Some(&SyncStatus::Synced));
    }

    #[test]
    fn last_write_wins_per_field() {
        let mut board = board_with(&[Task::new("abc", "Call Mom", ymd(10))]);

        assert!(board.apply_local_update("abc", &TaskPatch::state("Doing")));
        assert!(board.apply_local_update("abc", &TaskPatch::date(ymd(12))));
        assert!(board.apply_local_update("abc", &TaskPatch::state("Done")));

        let task = board.get("abc").unwrap();
        assert_eq!(task.state(), "Done");
        assert_eq!(task.date(), ymd(12));
        assert_eq!(board.sync_status("abc"), Some(&SyncStatus::LocallyModified));
    }

    #[test]
    fn confirmations() {
        let mut board = board_with(&[Task::new("a", "A", None), Task::new("b", "B", None)]);

        board.apply_local_update("a", &TaskPatch::state("Doing"));
        assert!(board.confirm_update("a", Ok(())).is_ok());
        assert_eq!(board.sync_status("a"), Some(&SyncStatus::Confirmed));
        assert_eq!(board.get("a").unwrap().state(), "Doing");

        board.apply_local_update("b", &TaskPatch::state("Doing"));
        let failure: Result<(), StoreError> = Err(StoreError::new("conflict"));
        let result = board.confirm_update("b", failure);
        assert!(matches!(result, Err(Error::Store(_))));
        // Not reverted
        assert_eq!(board.get("b").unwrap().state(), "Doing");
        assert_eq!(board.sync_status("b"), Some(&SyncStatus::Failed(StoreError::new("conflict"))));
        assert!(board.needs_refresh());
    }

    #[test]
    fn late_confirmation_does_not_touch_a_refreshed_task() {
        let mut board = board_with(&[Task::new("a", "A", None)]);
        // "a" was modified, then the board got refreshed before the store answered
        assert!(board.confirm_update("a", Ok(())).is_ok());
        assert_eq!(board.sync_status("a"), Some(&SyncStatus::Synced));
    }

    #[test]
    fn date_patches_keep_the_cache_sorted() {
        let mut board = board_with(&[
            Task::new("a", "A", None),
            Task::new("b", "B", ymd(10)),
            Task::new("c", "C", ymd(11)),
        ]);
        board.apply_local_update("c", &TaskPatch::date(None));
        let ids: Vec<&str> = board.tasks().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn remove_local() {
        let mut board = board_with(&[Task::new("a", "A", None)]);
        assert!(board.remove_local("missing").is_none());
        assert_eq!(board.remove_local("a").map(|t| t.name().to_string()), Some("A".to_string()));
        assert!(board.is_empty());
    }

    /// A store that keeps answering with the same page and the same cursor
    struct LoopingStore;

    #[async_trait]
    impl RemoteStore for LoopingStore {
        async fn query(&self, _query: &Query) -> Result<QueryResponse, StoreError> {
            let page = serde_json::json!({ "object": "page", "id": "abc", "properties": {} });
            Ok(QueryResponse { results: vec![page], has_more: true, next_cursor: Some("same".to_string()) })
        }
        async fn create_page(&mut self, _properties: &PropertyBag) -> Result<Value, StoreError> {
            Err(StoreError::new("read-only"))
        }
        async fn update_page(&mut self, _id: &str, _properties: &PropertyBag) -> Result<Value, StoreError> {
            Err(StoreError::new("read-only"))
        }
        async fn archive_page(&mut self, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::new("read-only"))
        }
    }

    #[tokio::test]
    async fn repeated_cursor_ends_the_refresh() {
        let mut board = TaskBoard::new(LoopingStore, Schema::default());
        board.refresh().await.unwrap();
        // First page, then the page behind "same", then the loop is detected. Duplicates are dropped.
        assert_eq!(board.len(), 1);
        assert!(board.last_refresh().is_some());
    }

    #[tokio::test]
    async fn missing_id_is_rejected_before_any_remote_call() {
        let mut board = board_with(&[]);
        let behaviour = std::sync::Arc::new(std::sync::Mutex::new(crate::mock_behaviour::MockBehaviour::fail_now(1)));
        board.store_mut().set_mock_behaviour(Some(behaviour.clone()));

        let result = board.update_task("", &TaskPatch::state("Done")).await;
        assert!(matches!(result, Err(Error::MissingInput(_))));
        let result = board.delete_task("").await;
        assert!(matches!(result, Err(Error::MissingInput(_))));

        // The mocked failure has not been consumed
        assert_eq!(behaviour.lock().unwrap().update_page_behaviour, (0, 1));
        assert_eq!(behaviour.lock().unwrap().archive_page_behaviour, (0, 1));
    }
}
